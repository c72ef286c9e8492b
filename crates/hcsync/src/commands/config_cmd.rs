//! Config subcommand handlers. None of these contact the controller.

use hcsync_config::{SecretTarget, config_path, load_config, store_password};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, PasswordTarget};
use crate::error::CliError;
use crate::output;

impl From<PasswordTarget> for SecretTarget {
    fn from(target: PasswordTarget) -> Self {
        match target {
            PasswordTarget::Hc => Self::Hc,
            PasswordTarget::Influx => Self::Influx,
        }
    }
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config_path(global.config.as_deref());

    match args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), false);
            Ok(())
        }

        ConfigCommand::Show => {
            let config = load_config(&path).map_err(|e| CliError::from_config(e, &path))?;
            let rendered = config
                .redacted()
                .to_toml()
                .map_err(|e| CliError::from_config(e, &path))?;
            output::print_output(&format!("# {}\n{rendered}", path.display()), false);
            Ok(())
        }

        ConfigCommand::SetPassword { target } => {
            let target = SecretTarget::from(target);
            let password = rpassword::prompt_password(format!("{target} password: "))?;
            if password.is_empty() {
                return Err(CliError::Usage {
                    message: "password cannot be empty".into(),
                    hint: None,
                });
            }
            store_password(target, &password).map_err(|e| CliError::from_config(e, &path))?;
            if !global.quiet {
                eprintln!("Stored {target} password in the system keyring");
            }
            Ok(())
        }
    }
}
