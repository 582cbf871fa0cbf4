mod ffmpeg;
mod ffprobe_probe;

pub use ffmpeg::FfmpegAudio;
pub use ffprobe_probe::FfprobeProbe;
