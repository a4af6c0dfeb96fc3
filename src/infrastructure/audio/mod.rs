mod cli_processor;
mod mock_processor;

pub use cli_processor::CliAudioProcessor;
pub use mock_processor::{FailingAudioProcessor, MockAudioProcessor, SlowAudioProcessor};
