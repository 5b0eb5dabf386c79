use std::io::BufRead;

use anyhow::Context;
use chain_eth::Wallet;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum WalletCommands {
    /// Generate a new keypair and print its address and private key
    New,

    /// Derive the address of an existing private key
    Import {
        /// Hex private key (0x optional); read from stdin when omitted
        #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
        key: Option<String>,
    },
}

pub fn run(action: WalletCommands) -> anyhow::Result<()> {
    match action {
        WalletCommands::New => {
            let wallet = Wallet::generate();
            println!("Address:     {}", wallet.address_hex());
            println!("Private key: {}", wallet.private_key_hex().as_str());
            eprintln!("Store the private key somewhere safe; it cannot be recovered.");
        }
        WalletCommands::Import { key } => {
            let key = match key {
                Some(key) => key,
                None => take_line(std::io::stdin().lock()).context("reading key from stdin")?,
            };
            let wallet = Wallet::from_private_key_hex(&key).context("importing private key")?;
            println!("Address: {}", wallet.address_hex());
        }
    }
    Ok(())
}

fn take_line<R: BufRead>(mut reader: R) -> std::io::Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_from_arg() {
        let key = "0x0000000000000000000000000000000000000000000000000000000000000001";
        run(WalletCommands::Import {
            key: Some(key.into()),
        })
        .unwrap();
    }

    #[test]
    fn import_rejects_garbage() {
        let err = run(WalletCommands::Import {
            key: Some("not-a-key".into()),
        })
        .unwrap_err();
        assert!(err.to_string().contains("importing private key"));
    }

    #[test]
    fn key_line_is_trimmed() {
        let input = b"  0xabc \n ignored\n";
        assert_eq!(take_line(&input[..]).unwrap(), "0xabc");
    }

    #[test]
    fn new_wallet_runs() {
        run(WalletCommands::New).unwrap();
    }
}
