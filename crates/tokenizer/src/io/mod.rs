//! Reading model files and reading/writing tokenizer options.

pub mod load;
pub mod save;

pub use load::{load_options, read_model_bytes, read_model_text};
pub use save::save_options;
