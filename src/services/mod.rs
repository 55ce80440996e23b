// Service exports
pub mod catalog;
pub mod history;
pub mod interpreter;

pub use catalog::{CatalogCache, CatalogError, CatalogStore};
pub use history::{HistoryError, SearchLogger, SearchRecord};
pub use interpreter::{
    backend_from_settings, DisabledBackend, InterpreterBackend, InterpreterError, OllamaBackend,
    OpenAiBackend, OpenRouterBackend, PreferenceAnalyzer,
};
