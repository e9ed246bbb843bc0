// Speech corpus — loading, deduplication, and cutoff filtering.

pub mod loader;
pub mod models;

pub use loader::{group_by_date, load_corpus, load_corpus_dir, load_corpus_with_cutoff, read_collections};
pub use models::{IdCollision, RawSpeech, SpeechCollection, SpeechCorpus, SpeechRecord};
