mod analyser;
mod file_player;
mod sample_buffer;
mod source_pipe;

pub use analyser::{AnalyserSource, FFT_SIZE};
pub use file_player::FilePlayer;
pub use sample_buffer::{SampleBuffer, SharedBuffer};
pub use source_pipe::SourcePipe;

/// Whatever currently feeds the shared sample buffer. Holds the cpal
/// stream, which must stay on the thread that built it.
pub enum Input {
    Device(SourcePipe),
    File(FilePlayer),
    Stopped,
}

impl Input {
    pub fn label(&self) -> String {
        match self {
            Input::Device(pipe) => pipe.current_name().to_string(),
            Input::File(player) => player.name().to_string(),
            Input::Stopped => "stopped".to_string(),
        }
    }

    /// Release the stream.
    pub fn stop(&mut self) {
        match self {
            Input::Device(pipe) => pipe.stop(),
            Input::File(player) => player.stop(),
            Input::Stopped => {}
        }
        *self = Input::Stopped;
    }
}
