use anyhow::Result;
use owo_colors::OwoColorize;
use worknest_core::WorknestConfig;

/// Settings to write back to the config file.
#[derive(Default)]
pub struct Changes {
    pub base_url: Option<String>,
    pub default_organization: Option<String>,
    pub access_token: Option<String>,
}

impl Changes {
    fn is_empty(&self) -> bool {
        self.base_url.is_none() && self.default_organization.is_none() && self.access_token.is_none()
    }

    fn apply(self, config: &mut WorknestConfig) {
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(organization) = self.default_organization {
            config.default_organization_id = organization;
        }
        if let Some(token) = self.access_token {
            config.access_token = Some(token).filter(|t| !t.is_empty());
        }
    }
}

pub fn run(init: bool, changes: Changes) -> Result<()> {
    let config_path = WorknestConfig::config_path()?;

    if init {
        if config_path.exists() {
            println!("  {}", "Config file already exists".dimmed());
        } else {
            WorknestConfig::create_default_config(&config_path)?;
            println!("{}", format!("  Wrote {}", config_path.display()).green());
        }
    }

    if !changes.is_empty() {
        WorknestConfig::update_file(&config_path, |config| changes.apply(config))?;
        println!("{}", format!("  Saved {}", config_path.display()).green());
    }

    let config = WorknestConfig::load()?;

    println!("{}", "Paths".bold());
    println!("  Config:   {}", config_path.display());
    println!("  Session:  {}", config.session_path()?.display());

    println!("{}", "Settings".bold());
    println!("  base_url:                {}", config.base_url);
    println!("  default_organization_id: {}", config.default_organization_id);
    println!("  request_timeout_secs:    {}", config.request_timeout_secs);
    println!("  verify_max_attempts:     {}", config.verify_max_attempts);
    println!("  verify_base_delay_ms:    {}", config.verify_base_delay_ms);
    println!(
        "  access_token:            {}",
        if config.access_token.is_some() { "set" } else { "not set" }
    );

    Ok(())
}
