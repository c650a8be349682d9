//! CLI command for managing hpgate configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use hpgate::remote::SessionManager;
use hpgate::Config;

#[derive(Args)]
#[command(about = "Manage hpgate configuration")]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show where configuration files are looked up
    Path,

    /// Write a configuration file with the defaults
    Init {
        /// Cluster username to store
        #[arg(long)]
        user: Option<String>,

        /// Project storage root to store
        #[arg(long)]
        project_base: Option<String>,

        /// Overwrite existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Check the configuration and optionally the connection
    Validate {
        /// Also open a connection to the cluster
        #[arg(long)]
        connect: bool,
    },
}

impl ConfigCommand {
    pub fn execute(&self) -> Result<()> {
        match &self.action {
            ConfigAction::Show => self.show_config(),
            ConfigAction::Path => self.show_path(),
            ConfigAction::Init {
                user,
                project_base,
                force,
            } => self.init_config(user.as_deref(), project_base.as_deref(), *force),
            ConfigAction::Validate { connect } => self.validate_config(*connect),
        }
    }

    fn show_config(&self) -> Result<()> {
        let config = Config::load()?;
        let yaml = serde_yaml::to_string(&config)?;
        println!("{}", yaml);
        Ok(())
    }

    fn show_path(&self) -> Result<()> {
        println!("Configuration files (first existing wins):");
        for path in Config::search_paths() {
            let status = if path.exists() { "exists" } else { "missing" };
            println!("  {} ({})", path.display(), status);
        }

        match Config::default_path() {
            Some(path) => println!("`config init` writes to: {}", path.display()),
            None => println!("Could not determine configuration directory"),
        }

        Ok(())
    }

    fn init_config(
        &self,
        user: Option<&str>,
        project_base: Option<&str>,
        force: bool,
    ) -> Result<()> {
        let path = Config::default_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine configuration directory"))?;

        if path.exists() && !force {
            println!("Configuration file already exists at: {}", path.display());
            println!("Use --force to overwrite");
            return Ok(());
        }

        let mut config = Config::default();
        if let Some(user) = user {
            config.user = user.to_string();
        }
        if let Some(base) = project_base {
            config.project_base = base.to_string();
        }

        config.save_to(&path)?;

        println!("Created configuration file at: {}", path.display());
        if config.user.is_empty() {
            println!();
            println!("Set your cluster username before connecting:");
            println!("  hpgate config init --force --user <name> --project-base /blue/<group>/<name>");
        }

        Ok(())
    }

    fn validate_config(&self, connect: bool) -> Result<()> {
        let config = Config::load()?;
        let problems = config.validate();

        if problems.is_empty() {
            println!("✓ Configuration OK ({}@{}:{})", config.user, config.host, config.port);
        } else {
            for problem in &problems {
                println!("✗ {}", problem);
            }
        }

        if connect {
            print!("Connecting to {}... ", config.host);
            let session = SessionManager::from_config(&config)?;
            match session.connect() {
                Ok(_) => println!("✓ OK"),
                Err(e) => {
                    println!("✗");
                    anyhow::bail!("{}", e);
                }
            }
        }

        if !problems.is_empty() {
            anyhow::bail!("{} configuration problem(s)", problems.len());
        }

        Ok(())
    }
}
