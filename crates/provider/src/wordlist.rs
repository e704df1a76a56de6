//! Word-list backend.
//!
//! Dictionaries are plain text files in one directory: `<lang>.dic` holds one
//! word per line (`#` starts a comment line) and `<lang>.personal.dic` holds
//! words the user added. `<lang>` may use `-` or `_` as separator.
//!
//! Setup on the affinity thread indexes the directory into a thread-local
//! language index; the factory and checkers hold `Rc` handles into it, which
//! keeps them on that thread.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use lexa_affinity::{ContextError, ThreadContext};

use crate::backend::{Backend, SpellChecker, SpellFactory, Suggestions};
use crate::encoding::WideString;
use crate::BackendError;

const DICTIONARY_EXTENSION: &str = "dic";
const PERSONAL_SUFFIX: &str = ".personal";
const MAX_EDIT_DISTANCE: usize = 2;
const MAX_SUGGESTIONS: usize = 8;

/// Word-list backend settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordListConfig {
	/// Directory holding `<lang>.dic` files.
	pub dir: PathBuf,
	/// Append personal additions to `<lang>.personal.dic`.
	pub persist_personal: bool,
}

impl WordListConfig {
	/// Creates a config reading dictionaries from `dir`, persisting personal words.
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self {
			dir: dir.into(),
			persist_personal: true,
		}
	}
}

/// Backend that checks words against plain word lists.
#[derive(Debug, Clone)]
pub struct WordListBackend {
	config: WordListConfig,
}

impl WordListBackend {
	pub fn new(config: WordListConfig) -> Self {
		Self { config }
	}
}

impl Backend for WordListBackend {
	fn identify(&self) -> &str {
		"wordlist"
	}

	fn describe(&self) -> &str {
		"Word List Provider"
	}

	fn context(&self) -> Box<dyn ThreadContext> {
		Box::new(WordListContext {
			config: self.config.clone(),
		})
	}

	fn create_factory(&self) -> Result<Box<dyn SpellFactory>, BackendError> {
		let index = INDEX.with(|slot| slot.borrow().clone()).ok_or(BackendError::NotInitialized)?;
		Ok(Box::new(WordListFactory { index }))
	}
}

thread_local! {
	static INDEX: RefCell<Option<Rc<LanguageIndex>>> = const { RefCell::new(None) };
}

#[derive(Debug)]
struct LanguageIndex {
	dir: PathBuf,
	persist_personal: bool,
	/// Language name (`en-US`) to file stem as found on disk.
	languages: BTreeMap<String, String>,
}

impl LanguageIndex {
	fn scan(config: &WordListConfig) -> Result<Self, BackendError> {
		let io_err = |error| BackendError::Io {
			path: config.dir.clone(),
			error,
		};
		let mut languages = BTreeMap::new();
		for entry in std::fs::read_dir(&config.dir).map_err(io_err)? {
			let path = entry.map_err(io_err)?.path();
			if path.extension().and_then(|ext| ext.to_str()) != Some(DICTIONARY_EXTENSION) {
				continue;
			}
			let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
				continue;
			};
			if stem.contains('.') {
				continue;
			}
			languages.insert(stem.replace('_', "-"), stem.to_string());
		}
		Ok(Self {
			dir: config.dir.clone(),
			persist_personal: config.persist_personal,
			languages,
		})
	}

	fn path(&self, stem: &str, suffix: &str) -> PathBuf {
		self.dir.join(format!("{stem}{suffix}.{DICTIONARY_EXTENSION}"))
	}
}

/// Thread context that indexes the dictionary directory.
struct WordListContext {
	config: WordListConfig,
}

impl ThreadContext for WordListContext {
	fn setup(&mut self) -> Result<(), ContextError> {
		let index = LanguageIndex::scan(&self.config).map_err(|err| ContextError::new(err.to_string()))?;
		tracing::debug!(dir = %index.dir.display(), languages = index.languages.len(), "wordlist.setup");
		INDEX.with(|slot| *slot.borrow_mut() = Some(Rc::new(index)));
		Ok(())
	}

	fn teardown(&mut self) {
		INDEX.with(|slot| slot.borrow_mut().take());
		tracing::debug!("wordlist.teardown");
	}
}

fn decode(wide: &[u16]) -> Result<String, BackendError> {
	String::from_utf16(wide).map_err(|_| BackendError::MalformedText)
}

struct WordListFactory {
	index: Rc<LanguageIndex>,
}

impl SpellFactory for WordListFactory {
	fn supported_languages(&self) -> Result<Vec<WideString>, BackendError> {
		Ok(self.index.languages.keys().map(|language| language.encode_utf16().collect()).collect())
	}

	fn is_supported(&self, language: &[u16]) -> Result<bool, BackendError> {
		Ok(self.index.languages.contains_key(&decode(language)?))
	}

	fn create_checker(&self, language: &[u16]) -> Result<Box<dyn SpellChecker>, BackendError> {
		let language = decode(language)?;
		let stem = self.index.languages.get(&language).ok_or_else(|| BackendError::Unsupported(language.clone()))?;

		let words = load_words(&self.index.path(stem, ""))?;
		let personal_path = self.index.path(stem, PERSONAL_SUFFIX);
		let personal = if personal_path.exists() { load_words(&personal_path)? } else { HashSet::new() };
		tracing::debug!(%language, words = words.len(), personal = personal.len(), "wordlist.load");

		Ok(Box::new(WordListChecker {
			index: Rc::clone(&self.index),
			words,
			personal: RefCell::new(personal),
			ignored: RefCell::default(),
			replacements: RefCell::default(),
			personal_path,
		}))
	}
}

fn load_words(path: &Path) -> Result<HashSet<String>, BackendError> {
	let text = std::fs::read_to_string(path).map_err(|error| BackendError::Io {
		path: path.to_path_buf(),
		error,
	})?;
	Ok(text
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.map(str::to_string)
		.collect())
}

struct WordListChecker {
	index: Rc<LanguageIndex>,
	words: HashSet<String>,
	personal: RefCell<HashSet<String>>,
	ignored: RefCell<HashSet<String>>,
	replacements: RefCell<HashMap<String, String>>,
	personal_path: PathBuf,
}

impl WordListChecker {
	fn knows(&self, word: &str) -> bool {
		self.words.contains(word) || self.personal.borrow().contains(word) || self.ignored.borrow().contains(word)
	}

	fn is_correct(&self, word: &str) -> bool {
		word.is_empty() || self.knows(word) || self.knows(&word.to_lowercase())
	}

	fn persist(&self, word: &str) -> Result<(), BackendError> {
		let io_err = |error| BackendError::Io {
			path: self.personal_path.clone(),
			error,
		};
		let mut file = OpenOptions::new().create(true).append(true).open(&self.personal_path).map_err(io_err)?;
		writeln!(file, "{word}").map_err(io_err)
	}
}

impl SpellChecker for WordListChecker {
	fn check(&self, word: &[u16]) -> Result<bool, BackendError> {
		Ok(self.is_correct(&decode(word)?))
	}

	fn suggest(&self, word: &[u16]) -> Result<Suggestions, BackendError> {
		let word = decode(word)?;
		if self.is_correct(&word) {
			return Ok(Suggestions::Correct);
		}

		let needle = word.to_lowercase();
		let personal = self.personal.borrow();
		let mut ranked: Vec<(usize, &str)> = self
			.words
			.iter()
			.chain(personal.iter())
			.filter_map(|candidate| {
				let distance = strsim::damerau_levenshtein(&needle, &candidate.to_lowercase());
				(distance <= MAX_EDIT_DISTANCE).then_some((distance, candidate.as_str()))
			})
			.collect();
		ranked.sort_unstable();
		ranked.dedup_by(|a, b| a.1 == b.1);

		let mut candidates: Vec<String> = Vec::with_capacity(MAX_SUGGESTIONS);
		if let Some(replacement) = self.replacements.borrow().get(&word) {
			candidates.push(replacement.clone());
		}
		for (_, candidate) in ranked {
			if candidates.len() == MAX_SUGGESTIONS {
				break;
			}
			if !candidates.iter().any(|c| c == candidate) {
				candidates.push(candidate.to_string());
			}
		}
		Ok(Suggestions::Candidates(candidates.iter().map(|c| c.encode_utf16().collect()).collect()))
	}

	fn add(&self, word: &[u16]) -> Result<(), BackendError> {
		let word = decode(word)?;
		if self.personal.borrow().contains(&word) {
			return Ok(());
		}
		// Only a word that reached the file counts as added.
		if self.index.persist_personal {
			self.persist(&word)?;
		}
		self.personal.borrow_mut().insert(word);
		Ok(())
	}

	fn ignore(&self, word: &[u16]) -> Result<(), BackendError> {
		self.ignored.borrow_mut().insert(decode(word)?);
		Ok(())
	}

	fn auto_correct(&self, from: &[u16], to: &[u16]) -> Result<(), BackendError> {
		let (from, to) = (decode(from)?, decode(to)?);
		self.replacements.borrow_mut().insert(from, to);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn wide(s: &str) -> WideString {
		s.encode_utf16().collect()
	}

	fn words(suggestions: Suggestions) -> Vec<String> {
		match suggestions {
			Suggestions::Correct => Vec::new(),
			Suggestions::Candidates(list) => list.iter().map(|w| String::from_utf16(w).unwrap()).collect(),
		}
	}

	fn fixture(persist_personal: bool) -> (tempfile::TempDir, WordListConfig) {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("en_US.dic"), "# English\nhello\nhelp\nhell\nworld\nword\n").unwrap();
		std::fs::write(dir.path().join("fr.dic"), "bonjour\n").unwrap();
		std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
		let config = WordListConfig {
			dir: dir.path().to_path_buf(),
			persist_personal,
		};
		(dir, config)
	}

	/// Runs `f` on a fresh thread with the context set up, like an affinity thread would.
	fn with_context<R: Send + 'static>(config: WordListConfig, f: impl FnOnce(&WordListBackend) -> R + Send + 'static) -> R {
		std::thread::spawn(move || {
			let backend = WordListBackend::new(config);
			let mut context = backend.context();
			context.setup().unwrap();
			let result = f(&backend);
			context.teardown();
			result
		})
		.join()
		.unwrap()
	}

	#[test]
	fn factory_requires_context() {
		let (_dir, config) = fixture(false);
		let backend = WordListBackend::new(config);
		assert!(matches!(backend.create_factory(), Err(BackendError::NotInitialized)));
	}

	#[test]
	fn setup_fails_for_missing_directory() {
		let backend = WordListBackend::new(WordListConfig::new("/nonexistent/lexa/dicts"));
		assert!(backend.context().setup().is_err());
	}

	#[test]
	fn indexes_languages_with_normalized_names() {
		let (_dir, config) = fixture(false);
		let languages = with_context(config, |backend| {
			let factory = backend.create_factory().unwrap();
			assert!(factory.is_supported(&wide("en-US")).unwrap());
			assert!(!factory.is_supported(&wide("de-DE")).unwrap());
			factory.supported_languages().unwrap()
		});
		assert_eq!(languages, vec![wide("en-US"), wide("fr")]);
	}

	#[test]
	fn checks_and_suggests() {
		let (_dir, config) = fixture(false);
		with_context(config, |backend| {
			let checker = backend.create_factory().unwrap().create_checker(&wide("en-US")).unwrap();
			assert!(checker.check(&wide("hello")).unwrap());
			assert!(checker.check(&wide("Hello")).unwrap());
			assert!(checker.check(&wide("")).unwrap());
			assert!(!checker.check(&wide("helo")).unwrap());

			assert_eq!(checker.suggest(&wide("hello")).unwrap(), Suggestions::Correct);
			assert_eq!(words(checker.suggest(&wide("helo")).unwrap()), vec!["hell", "hello", "help"]);
			assert!(words(checker.suggest(&wide("xyzzyq")).unwrap()).is_empty());
		});
	}

	#[test]
	fn replacement_is_suggested_first() {
		let (_dir, config) = fixture(false);
		with_context(config, |backend| {
			let checker = backend.create_factory().unwrap().create_checker(&wide("en-US")).unwrap();
			checker.auto_correct(&wide("wrold"), &wide("world")).unwrap();
			assert_eq!(words(checker.suggest(&wide("wrold")).unwrap())[0], "world");
		});
	}

	#[test]
	fn ignore_is_session_only() {
		let (_dir, config) = fixture(true);
		let dir = config.dir.clone();
		with_context(config, |backend| {
			let checker = backend.create_factory().unwrap().create_checker(&wide("en-US")).unwrap();
			checker.ignore(&wide("lexa")).unwrap();
			assert!(checker.check(&wide("lexa")).unwrap());
		});
		assert!(!dir.join("en_US.personal.dic").exists());
	}

	#[test]
	fn personal_words_persist_across_checkers() {
		let (_dir, config) = fixture(true);
		let dir = config.dir.clone();
		with_context(config.clone(), |backend| {
			let checker = backend.create_factory().unwrap().create_checker(&wide("en-US")).unwrap();
			checker.add(&wide("rustacean")).unwrap();
			checker.add(&wide("rustacean")).unwrap();
			assert!(checker.check(&wide("rustacean")).unwrap());
		});
		assert_eq!(std::fs::read_to_string(dir.join("en_US.personal.dic")).unwrap(), "rustacean\n");

		let known = with_context(config, |backend| {
			let checker = backend.create_factory().unwrap().create_checker(&wide("en-US")).unwrap();
			checker.check(&wide("rustacean")).unwrap()
		});
		assert!(known);
	}

	#[test]
	fn failed_persist_leaves_word_unknown() {
		let (_dir, config) = fixture(true);
		let personal = config.dir.join("en_US.personal.dic");
		with_context(config, move |backend| {
			let checker = backend.create_factory().unwrap().create_checker(&wide("en-US")).unwrap();
			std::fs::create_dir(&personal).unwrap();

			assert!(matches!(checker.add(&wide("rustacean")), Err(BackendError::Io { .. })));
			assert!(!checker.check(&wide("rustacean")).unwrap());
			assert!(checker.add(&wide("rustacean")).is_err());

			std::fs::remove_dir(&personal).unwrap();
			checker.add(&wide("rustacean")).unwrap();
			assert!(checker.check(&wide("rustacean")).unwrap());
			assert_eq!(std::fs::read_to_string(&personal).unwrap(), "rustacean\n");
		});
	}
}
