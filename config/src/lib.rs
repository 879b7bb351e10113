pub mod crypto;
pub mod env;
pub mod paths;
pub mod settings;

pub use env::{AllowedOrigins, ClientEnv, ServerEnv};
pub use paths::PathManager;
pub use settings::{ClientSettings, ContextWindowSetting};

use std::path::PathBuf;

/// Load environment variables from ./.env, then ~/.env.
/// The project file wins over the home file; both lose to the real environment.
/// Call this before parsing CLI args to ensure env vars are available.
pub fn load_env_file() {
    let project = std::env::current_dir().ok().map(|dir| dir.join(".env"));
    let home = dirs::home_dir().map(|dir| dir.join(".env"));
    load_env_files(project.iter().chain(home.iter()));
}

/// dotenv never overwrites a variable that is already set, so earlier files win.
fn load_env_files<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) {
    for path in paths {
        dotenv::from_path(path).ok();
    }
}
