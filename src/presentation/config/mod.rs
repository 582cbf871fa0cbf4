mod settings;

pub use settings::{
    ChatSettings, DatabaseSettings, MediaSettings, OpenRouterSettings, ServerSettings, Settings,
    SettingsError, TranscriptionSettings,
};
