use chain_eth::chains::{supported_chains, EvmChain, DEFAULT_CHAIN_ID};

pub fn run(json: bool) -> anyhow::Result<()> {
    let chains = supported_chains();
    if json {
        println!("{}", serde_json::to_string_pretty(&chains)?);
    } else {
        for chain in chains {
            println!("{}", describe_chain(chain));
        }
    }
    Ok(())
}

fn describe_chain(chain: &EvmChain) -> String {
    let marker = if chain.chain_id == DEFAULT_CHAIN_ID { "*" } else { " " };
    let kind = if chain.is_testnet { "testnet" } else { "mainnet" };
    format!(
        "{marker} {:>9}  {:<13} {:<8} {}",
        chain.chain_id, chain.name, kind, chain.rpc_url
    )
}
