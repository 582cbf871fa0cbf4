mod http_media_fetcher;
mod ytdlp_fetcher;

pub use http_media_fetcher::HttpMediaFetcher;
pub use ytdlp_fetcher::YtDlpFetcher;
