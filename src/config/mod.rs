mod settings;

pub use settings::{
    CompletionConfig, ConversationConfig, LoggingConfig, ProviderConfig, ReviewConfig, Settings,
    TestingConfig,
};
