use crate::config::IdentityConfig;
use crate::core::{GpgResource, IdentityStore};
use crate::crypto::pgp::{Identity, Recipient, TrustedPeer};
use crate::crypto::{MessageCipher, SignerStatus};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gpg-identity")]
#[command(about = "Self-signed PGP identities and encrypted messages for an admin")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the stored identity
    #[arg(short, long, global = true, default_value = "./gpg_identity")]
    pub store: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create and store a new identity, then export its public key
    Init {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Overrides the comment from the configuration file
        #[arg(long)]
        comment: Option<String>,
        /// Admin public key, binary or armored
        #[arg(long)]
        admin_key: Option<PathBuf>,
        /// Directory receiving PubGPG1.gpg
        #[arg(long)]
        out: PathBuf,
    },
    /// Export the stored public key as PubGPG1.gpg
    Export {
        #[arg(long)]
        out: PathBuf,
    },
    /// Encrypt a message for the admin into MessageForAdmin.gpg
    WriteAdmin {
        #[arg(long)]
        admin_key: PathBuf,
        #[arg(long)]
        out: PathBuf,
        message: String,
    },
    /// Encrypt a message for a peer and print it base64 encoded
    Encrypt {
        /// Recipient public key
        #[arg(long)]
        to: PathBuf,
        message: String,
    },
    /// Decrypt a base64 message addressed to the stored identity
    Decrypt {
        /// Public key expected to have signed the message
        #[arg(long)]
        from: Option<PathBuf>,
        blob: String,
    },
    /// Print the public state of the stored identity as JSON
    Show,
}

pub struct CliApp {
    config: IdentityConfig,
    store: IdentityStore,
}

impl CliApp {
    pub fn new(config: IdentityConfig, store_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            store: IdentityStore::new(store_dir),
        }
    }

    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => IdentityConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => IdentityConfig::default(),
        };
        Ok(Self::new(config, cli.store.clone()))
    }

    fn load_identity(&self) -> Result<Identity> {
        self.store
            .load(self.config.passphrase())?
            .ok_or_else(|| {
                anyhow!(
                    "No identity stored in {}; run `init` first",
                    self.store.dir().display()
                )
            })
    }

    pub fn init(
        &self,
        name: &str,
        email: &str,
        comment: Option<String>,
        admin_key: Option<&Path>,
        out: &Path,
    ) -> Result<PathBuf> {
        if self.store.exists() {
            return Err(anyhow!(
                "An identity is already stored in {}",
                self.store.dir().display()
            ));
        }

        let mut config = self.config.clone();
        if let Some(comment) = comment {
            config.comment = comment;
        }

        let resource = GpgResource::new(name, email, admin_key, &config)?;
        self.store.save(resource.identity())?;
        let path = resource.export_public_key(out)?;

        info!(
            "Created identity {} ({})",
            resource.identity().user_id(),
            resource.identity().fingerprint()
        );
        Ok(path)
    }

    pub fn export(&self, out: &Path) -> Result<PathBuf> {
        let resource = GpgResource::from_parts(self.load_identity()?, None);
        Ok(resource.export_public_key(out)?)
    }

    pub fn write_admin(&self, admin_key: &Path, out: &Path, message: &str) -> Result<PathBuf> {
        let admin = TrustedPeer::from_file(admin_key)?;
        let resource = GpgResource::from_parts(self.load_identity()?, Some(admin));
        Ok(resource.write_to_admin(message, out)?)
    }

    pub fn encrypt(&self, to: &Path, message: &str) -> Result<String> {
        let peer = TrustedPeer::from_file(to)?;
        let resource = GpgResource::from_parts(self.load_identity()?, None);
        Ok(resource.encrypt_to(&peer, message)?)
    }

    pub fn decrypt(&self, from: Option<&Path>, blob: &str) -> Result<(String, SignerStatus)> {
        let identity = self.load_identity()?;
        let sender = from.map(TrustedPeer::from_file).transpose()?;

        let mut candidates: Vec<&dyn Recipient> = vec![&identity];
        if let Some(sender) = &sender {
            candidates.push(sender);
        }

        let decrypted = MessageCipher::decrypt(&identity, blob, &candidates)?;
        Ok((decrypted.plaintext, decrypted.signer))
    }

    pub fn show(&self) -> Result<String> {
        let resource = GpgResource::from_parts(self.load_identity()?, None);
        Ok(resource.state()?.to_json()?)
    }
}

/// One-line signer report printed next to decrypted output.
pub fn describe_signer(signer: &SignerStatus) -> String {
    match signer {
        SignerStatus::Verified {
            user_id,
            fingerprint,
        } => format!("Good signature from {} ({})", user_id, fingerprint),
        SignerStatus::Unverified {
            issuer: Some(issuer),
        } => format!("Signature by unknown key {} could not be verified", issuer),
        SignerStatus::Unverified { issuer: None } => "Message is not signed".to_string(),
    }
}

pub fn run_cli(cli: Cli) -> Result<()> {
    let app = CliApp::from_cli(&cli)?;

    match cli.command {
        Commands::Init {
            name,
            email,
            comment,
            admin_key,
            out,
        } => {
            let path = app.init(&name, &email, comment, admin_key.as_deref(), &out)?;
            println!("Public key written to {}", path.display());
        }

        Commands::Export { out } => {
            let path = app.export(&out)?;
            println!("Public key written to {}", path.display());
        }

        Commands::WriteAdmin {
            admin_key,
            out,
            message,
        } => {
            let path = app.write_admin(&admin_key, &out, &message)?;
            println!("Message for admin written to {}", path.display());
        }

        Commands::Encrypt { to, message } => {
            println!("{}", app.encrypt(&to, &message)?);
        }

        Commands::Decrypt { from, blob } => {
            let (plaintext, signer) = app.decrypt(from.as_deref(), &blob)?;
            eprintln!("{}", describe_signer(&signer));
            println!("{}", plaintext);
        }

        Commands::Show => {
            println!("{}", app.show()?);
        }
    }

    Ok(())
}
