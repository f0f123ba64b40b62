//! Load lesson catalogs from disk and index them.
//!
//! Layout:
//!
//! ```text
//! lessons/
//!   serbian/
//!     language.toml
//!     lesson01.json
//!     lesson02.json
//!   croatian/
//!     ...
//! ```
//!
//! Loading is an explicit startup step; the resulting [`Catalog`] is
//! immutable and shared behind an `Arc`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{Language, Lesson, MatchPairsQuestion, Question};
use crate::paths;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid language config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("duplicate lesson id {id:?} in language {language:?}")]
    DuplicateLesson { language: String, id: String },
}

/// Lessons of one language, sorted by `order`
#[derive(Debug, Clone)]
pub struct LanguageCatalog {
    pub language: Language,
    lessons: Vec<Lesson>,
    by_id: HashMap<String, usize>,
}

impl LanguageCatalog {
    /// Build the index; derived quiz fields are filled in here
    pub fn new(language: Language, mut lessons: Vec<Lesson>) -> Result<Self, CatalogError> {
        lessons.sort_by_key(|l| l.order);
        for lesson in &mut lessons {
            prepare_lesson(lesson);
        }

        let mut by_id = HashMap::with_capacity(lessons.len());
        for (idx, lesson) in lessons.iter().enumerate() {
            if by_id.insert(lesson.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateLesson {
                    language: language.slug.clone(),
                    id: lesson.id.clone(),
                });
            }
        }

        Ok(Self {
            language,
            lessons,
            by_id,
        })
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn lesson(&self, id: &str) -> Option<&Lesson> {
        self.by_id.get(id).map(|&idx| &self.lessons[idx])
    }

    /// The lesson whose order immediately follows `id`'s
    pub fn next_lesson(&self, id: &str) -> Option<&Lesson> {
        let current = self.lesson(id)?;
        self.lessons.iter().find(|l| l.order == current.order + 1)
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

/// All languages, keyed by slug
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    languages: HashMap<String, LanguageCatalog>,
}

impl Catalog {
    pub fn from_languages(languages: impl IntoIterator<Item = LanguageCatalog>) -> Self {
        Self {
            languages: languages
                .into_iter()
                .map(|lc| (lc.language.slug.clone(), lc))
                .collect(),
        }
    }

    /// Load every language directory under `lessons_dir`.
    ///
    /// Directories without a `language.toml` are skipped. A missing
    /// `lessons_dir` yields an empty catalog.
    pub fn load(lessons_dir: &Path) -> Result<Self, CatalogError> {
        if !lessons_dir.exists() {
            tracing::warn!("Lessons directory {} not found", lessons_dir.display());
            return Ok(Self::default());
        }

        let mut languages = Vec::new();
        for entry in read_dir_sorted(lessons_dir)? {
            if !entry.is_dir() {
                continue;
            }
            let config_path = paths::language_config_path(&entry);
            if !config_path.exists() {
                tracing::debug!("Skipping {} (no language.toml)", entry.display());
                continue;
            }
            let language_catalog = load_language(&entry)?;
            tracing::info!(
                "Loaded {} lessons for {}",
                language_catalog.len(),
                language_catalog.language.display_name
            );
            languages.push(language_catalog);
        }

        Ok(Self::from_languages(languages))
    }

    pub fn language(&self, slug: &str) -> Option<&LanguageCatalog> {
        self.languages.get(slug)
    }

    /// Languages sorted by display name
    pub fn languages(&self) -> Vec<&LanguageCatalog> {
        let mut all: Vec<_> = self.languages.values().collect();
        all.sort_by(|a, b| a.language.display_name.cmp(&b.language.display_name));
        all
    }

    pub fn lesson(&self, slug: &str, id: &str) -> Option<&Lesson> {
        self.language(slug)?.lesson(id)
    }
}

fn load_language(dir: &Path) -> Result<LanguageCatalog, CatalogError> {
    let config_path = paths::language_config_path(dir);
    let raw = fs::read_to_string(&config_path).map_err(|source| CatalogError::Io {
        path: config_path.clone(),
        source,
    })?;
    let language: Language = toml::from_str(&raw).map_err(|source| CatalogError::Config {
        path: config_path.clone(),
        source,
    })?;

    let mut lessons = Vec::new();
    for path in read_dir_sorted(dir)? {
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let data = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })?;
        let lesson: Lesson =
            serde_json::from_str(&data).map_err(|source| CatalogError::Parse { path, source })?;
        lessons.push(lesson);
    }

    LanguageCatalog::new(language, lessons)
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let io_err = |source| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort();
    Ok(entries)
}

/// Fill in fields computed from the lesson content
fn prepare_lesson(lesson: &mut Lesson) {
    let mut questions = std::mem::take(&mut lesson.quiz.questions);
    for question in &mut questions {
        match question {
            Question::ListenAndChoose(q) => {
                q.audio_text = q
                    .word_id
                    .as_deref()
                    .and_then(|id| lesson.find_word(id))
                    .map(|word| word.target_primary.clone())
                    .or_else(|| q.options.get(q.correct).cloned())
                    .unwrap_or_default();
            }
            Question::MatchPairs(q) => {
                q.shuffled_targets = MatchPairsQuestion::shuffle_targets(&q.pairs);
            }
            Question::MultipleChoice(_) | Question::TypeAnswer(_) => {}
        }
    }
    lesson.quiz.questions = questions;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SERBIAN_TOML: &str = r#"
slug = "serbian"
display_name = "Serbian"
tts_code = "sr"
has_dual_script = true
script_label = "Latin"
alt_script_label = "Cyrillic"
"#;

    fn lesson_json(id: &str, order: u32) -> String {
        format!(
            r#"{{
  "id": "{id}",
  "title": "Lesson {order}",
  "order": {order},
  "sections": [
    {{"type": "vocabulary", "title": "Words", "items": [
      {{"id": "{id}-hello", "english": "hello", "target_primary": "zdravo"}}
    ]}}
  ],
  "quiz": {{"questions": [
    {{"type": "listen_and_choose", "options": ["hvala", "zdravo"], "correct": 1, "word_id": "{id}-hello"}},
    {{"type": "listen_and_choose", "options": ["da", "ne"], "correct": 0}},
    {{"type": "match_pairs", "pairs": [{{"english": "yes", "target": "da"}}, {{"english": "no", "target": "ne"}}]}}
  ]}}
}}"#
        )
    }

    fn write_language(root: &Path, slug: &str, toml: &str, lessons: &[(&str, u32)]) {
        let dir = root.join(slug);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("language.toml"), toml).unwrap();
        for (id, order) in lessons {
            fs::write(dir.join(format!("{id}.json")), lesson_json(id, *order)).unwrap();
        }
    }

    #[test]
    fn test_load_sorts_by_order_and_indexes() {
        let temp = TempDir::new().unwrap();
        // File names deliberately out of order
        write_language(
            temp.path(),
            "serbian",
            SERBIAN_TOML,
            &[("b-second", 2), ("a-third", 3), ("c-first", 1)],
        );

        let catalog = Catalog::load(temp.path()).unwrap();
        let serbian = catalog.language("serbian").unwrap();
        let ids: Vec<_> = serbian.lessons().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["c-first", "b-second", "a-third"]);
        assert!(serbian.language.has_dual_script);

        assert_eq!(serbian.next_lesson("c-first").unwrap().id, "b-second");
        assert_eq!(serbian.next_lesson("b-second").unwrap().id, "a-third");
        assert!(serbian.next_lesson("a-third").is_none());
        assert!(serbian.next_lesson("missing").is_none());
        assert!(catalog.lesson("serbian", "b-second").is_some());
        assert!(catalog.lesson("klingon", "b-second").is_none());
    }

    #[test]
    fn test_derived_quiz_fields() {
        let temp = TempDir::new().unwrap();
        write_language(temp.path(), "serbian", SERBIAN_TOML, &[("l1", 1)]);

        let catalog = Catalog::load(temp.path()).unwrap();
        let lesson = catalog.lesson("serbian", "l1").unwrap();
        match &lesson.quiz.questions[0] {
            Question::ListenAndChoose(q) => assert_eq!(q.audio_text, "zdravo"),
            other => panic!("unexpected question {:?}", other),
        }
        // No word id: falls back to the correct option
        match &lesson.quiz.questions[1] {
            Question::ListenAndChoose(q) => assert_eq!(q.audio_text, "da"),
            other => panic!("unexpected question {:?}", other),
        }
        match &lesson.quiz.questions[2] {
            Question::MatchPairs(q) => assert_eq!(q.shuffled_targets, ["ne", "da"]),
            other => panic!("unexpected question {:?}", other),
        }
    }

    #[test]
    fn test_languages_sorted_by_display_name() {
        let temp = TempDir::new().unwrap();
        write_language(temp.path(), "serbian", SERBIAN_TOML, &[("l1", 1)]);
        write_language(
            temp.path(),
            "croatian",
            "slug = \"croatian\"\ndisplay_name = \"Croatian\"\ntts_code = \"hr\"\n",
            &[("l1", 1)],
        );
        // Not a language: no language.toml
        fs::create_dir_all(temp.path().join("drafts")).unwrap();

        let catalog = Catalog::load(temp.path()).unwrap();
        let names: Vec<_> = catalog
            .languages()
            .iter()
            .map(|lc| lc.language.display_name.as_str())
            .collect();
        assert_eq!(names, ["Croatian", "Serbian"]);
        assert_eq!(catalog.language("croatian").unwrap().language.script_label, "Latin");
    }

    #[test]
    fn test_duplicate_lesson_id_rejected() {
        let temp = TempDir::new().unwrap();
        write_language(temp.path(), "serbian", SERBIAN_TOML, &[("l1", 1)]);
        fs::write(
            temp.path().join("serbian").join("copy.json"),
            lesson_json("l1", 2),
        )
        .unwrap();

        let err = Catalog::load(temp.path()).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateLesson { .. }));
    }

    #[test]
    fn test_malformed_lesson_reports_path() {
        let temp = TempDir::new().unwrap();
        write_language(temp.path(), "serbian", SERBIAN_TOML, &[]);
        fs::write(temp.path().join("serbian").join("broken.json"), "{not json").unwrap();

        let err = Catalog::load(temp.path()).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_missing_dir_is_empty_catalog() {
        let temp = TempDir::new().unwrap();
        let catalog = Catalog::load(&temp.path().join("nope")).unwrap();
        assert!(catalog.languages().is_empty());
    }
}
