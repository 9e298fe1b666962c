//! Bootstrap command rendering.

use crate::types::Host;

/// Renders the shell command that provisions one host.
pub trait CommandBuilder: Send + Sync {
    fn build(&self, host: &Host) -> String;
}

impl<F> CommandBuilder for F
where
    F: Fn(&Host) -> String + Send + Sync,
{
    fn build(&self, host: &Host) -> String {
        self(host)
    }
}

/// SSH credentials interpolated into the command.
#[derive(Clone, Default)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"********")
            .finish()
    }
}

/// `knife bootstrap` invocation template.
#[derive(Debug, Clone)]
pub struct KnifeBootstrap {
    /// Tool prefix, `knife` unless overridden
    pub tool: String,
    /// Pass `--sudo` to the bootstrap
    pub sudo: bool,
    pub credentials: Credentials,
}

impl Default for KnifeBootstrap {
    fn default() -> Self {
        Self {
            tool: "knife".to_string(),
            sudo: true,
            credentials: Credentials::default(),
        }
    }
}

impl KnifeBootstrap {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            ..Self::default()
        }
    }
}

impl CommandBuilder for KnifeBootstrap {
    fn build(&self, host: &Host) -> String {
        let mut cmd = format!(
            "{} bootstrap {} -N {} -E {}",
            self.tool,
            host.fqdn(),
            host.hostname,
            host.environment
        );
        if self.sudo {
            cmd.push_str(" --sudo");
        }
        cmd.push_str(&format!(
            " --ssh-user {} --ssh-password {} -r {}",
            self.credentials.user, self.credentials.password, host.run_list
        ));
        cmd
    }
}
