use crate::error::Result;
use crate::gemini::api_key;
use crate::settings::{load_settings, settings_path};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let path = settings_path();

    println!(
        "Settings:   {}{}",
        path.display(),
        if path.exists() { "" } else { " (defaults)" }
    );
    println!("Model:      {}", settings.model);
    println!("Endpoint:   {}", settings.api_base_url);
    println!("Timeout:    {}s", settings.timeout_secs);
    match api_key(&settings) {
        Ok(_) => println!("Credential: {} is set", settings.api_key_env),
        Err(e) => println!("Credential: {e}"),
    }
    Ok(())
}
