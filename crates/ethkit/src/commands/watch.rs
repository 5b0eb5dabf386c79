//! Polling monitors for new blocks and ERC-20 `Transfer` events.
//!
//! Both loops start at the current head unless told otherwise, tick on a
//! fixed interval and never exit on a failed poll: the error is logged and
//! the same block range is retried on the next tick.

use std::fmt::Write as _;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::Context;
use chain_eth::address::to_checksum;
use chain_eth::erc20::{self, TransferEvent, TRANSFER_EVENT_TOPIC};
use chain_eth::units::{format_units, to_display};
use chrono::DateTime;
use clap::Args;
use eth_rpc::{Block, BlockCursor, Log, LogFilter, ProviderError, RpcProvider};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::query::parse_account;

/// Blocks fetched per tick at most; a long outage is caught up gradually.
const MAX_BLOCKS_PER_TICK: u64 = 100;

/// Widest block range sent to `eth_getLogs`. Many public nodes cap it.
const MAX_LOG_SPAN: u64 = 1_000;

/// Transactions listed per block.
const TXS_SHOWN: usize = 3;

#[derive(Args, Debug)]
pub struct WatchBlocksArgs {
    /// Seconds between polls
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,
}

#[derive(Args, Debug)]
pub struct WatchTransfersArgs {
    /// Only report transfers of this token contract
    #[arg(long)]
    pub token: Option<String>,

    /// First block to scan; defaults to the current head
    #[arg(long)]
    pub from_block: Option<u64>,

    /// Seconds between polls
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,
}

pub async fn blocks<P: RpcProvider>(provider: &P, args: &WatchBlocksArgs) -> anyhow::Result<()> {
    let head = provider
        .block_number()
        .await
        .context("fetching latest block")?;
    let mut cursor = BlockCursor::after(head);
    info!(head, interval = args.interval, "watching for new blocks");

    let mut ticker = ticker(args.interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("stopped");
                return Ok(());
            }
        }
        if let Err(e) = poll_blocks(provider, &mut cursor, |block| {
            print!("{}", describe_block(block))
        })
        .await
        {
            warn!(error = %e, next = cursor.next_block(), "block poll failed, retrying next tick");
        }
    }
}

pub async fn transfers<P: RpcProvider>(
    provider: &P,
    args: &WatchTransfersArgs,
) -> anyhow::Result<()> {
    let token = args
        .token
        .as_deref()
        .map(parse_account)
        .transpose()
        .context("--token")?;

    let start = match args.from_block {
        Some(block) => block,
        None => provider
            .block_number()
            .await
            .context("fetching latest block")?,
    };
    let mut cursor = BlockCursor::starting_at(start);

    let decimals = match token {
        Some(token) => token_decimals(provider, token).await,
        None => None,
    };
    info!(from = start, token = ?token, interval = args.interval, "watching Transfer events");

    let mut ticker = ticker(args.interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("stopped");
                return Ok(());
            }
        }
        let result = poll_transfers(provider, &mut cursor, token, |log, event| {
            print!("{}", describe_transfer(log, event, decimals))
        })
        .await;
        if let Err(e) = result {
            warn!(error = %e, next = cursor.next_block(), "log poll failed, retrying next tick");
        }
    }
}

fn ticker(secs: u64) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(Duration::from_secs(secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn token_decimals<P: RpcProvider>(provider: &P, token: Address) -> Option<u8> {
    let result = provider.call(token, erc20::encode_decimals()).await;
    match result.map(|data| erc20::decode_decimals(&data)) {
        Ok(Ok(decimals)) => Some(decimals),
        Ok(Err(e)) => {
            warn!(%token, error = %e, "token decimals unreadable, showing raw values");
            None
        }
        Err(e) => {
            warn!(%token, error = %e, "token decimals unavailable, showing raw values");
            None
        }
    }
}

/// Fetches every block between the cursor and the head, handing each to
/// `on_block` in order. The cursor advances per delivered block, so a
/// failure part-way through resumes at the first undelivered one.
pub async fn poll_blocks<P, F>(
    provider: &P,
    cursor: &mut BlockCursor,
    mut on_block: F,
) -> Result<usize, ProviderError>
where
    P: RpcProvider,
    F: FnMut(&Block),
{
    let head = provider.block_number().await?;
    let Some(range) = cursor.pending_range(head, MAX_BLOCKS_PER_TICK) else {
        return Ok(0);
    };

    let mut delivered = 0;
    for number in range {
        match provider.block_by_number(number).await? {
            Some(block) => {
                on_block(&block);
                cursor.advance_past(number);
                delivered += 1;
            }
            None => {
                // Load-balanced nodes can report a head they cannot serve yet.
                debug!(number, "block not available yet");
                break;
            }
        }
    }
    Ok(delivered)
}

/// Queries `Transfer` logs for the blocks between the cursor and the head.
/// Logs that are not ERC-20 transfers (ERC-721 shares the topic) are skipped.
pub async fn poll_transfers<P, F>(
    provider: &P,
    cursor: &mut BlockCursor,
    token: Option<Address>,
    mut on_transfer: F,
) -> Result<usize, ProviderError>
where
    P: RpcProvider,
    F: FnMut(&Log, &TransferEvent),
{
    let head = provider.block_number().await?;
    let Some(range) = cursor.pending_range(head, MAX_LOG_SPAN) else {
        return Ok(0);
    };

    let mut filter = LogFilter::new()
        .from_block(*range.start())
        .to_block(*range.end())
        .topic0(TRANSFER_EVENT_TOPIC);
    if let Some(token) = token {
        filter = filter.address(token);
    }

    let logs = provider.logs(filter).await?;
    let mut delivered = 0;
    for log in &logs {
        match TransferEvent::decode(&log.topics, &log.data) {
            Ok(event) => {
                on_transfer(log, &event);
                delivered += 1;
            }
            Err(e) => debug!(contract = %log.address, error = %e, "skipping log"),
        }
    }
    cursor.advance_past(*range.end());
    Ok(delivered)
}

pub fn describe_block(block: &Block) -> String {
    let mut out = String::new();
    let time = i64::try_from(block.timestamp)
        .ok()
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("timestamp {}", block.timestamp));

    let _ = writeln!(
        out,
        "Block #{} | {} | {} transactions | gas used {}",
        block.number,
        time,
        block.transactions.len(),
        block.gas_used
    );
    for tx in block.transactions.iter().take(TXS_SHOWN) {
        let to = tx
            .to
            .map(|a| to_checksum(&a))
            .unwrap_or_else(|| "(contract creation)".into());
        let _ = writeln!(
            out,
            "  0x{} {} -> {} {} ETH",
            hex::encode(tx.hash),
            to_checksum(&tx.from),
            to,
            to_display(&tx.value)
        );
    }
    if block.transactions.len() > TXS_SHOWN {
        let _ = writeln!(out, "  ... and {} more", block.transactions.len() - TXS_SHOWN);
    }
    out
}

pub fn describe_transfer(log: &Log, event: &TransferEvent, decimals: Option<u8>) -> String {
    let value = match decimals {
        Some(decimals) => format_units(&event.value, decimals),
        None => event.value.to_string(),
    };
    let block = log
        .block_number
        .map(|n| n.to_string())
        .unwrap_or_else(|| "pending".into());
    format!(
        "[block {block}] token {} | {} -> {} | {value}\n",
        to_checksum(&log.address),
        to_checksum(&event.from),
        to_checksum(&event.to),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Bytes, B256};
    use chain_eth::Amount;
    use eth_rpc::{HttpProvider, NodeConfig};
    use mockito::{Matcher, ServerGuard};
    use serde_json::json;

    const TOKEN: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";
    const FROM_TOPIC: &str = "0x0000000000000000000000001234567890abcdef1234567890abcdef12345678";
    const TO_TOPIC: &str = "0x0000000000000000000000003535353535353535353535353535353535353535";

    fn provider_for(server: &ServerGuard) -> HttpProvider {
        let config = NodeConfig::new(server.url().parse().unwrap(), 1);
        HttpProvider::new(&config).unwrap()
    }

    async fn respond(server: &mut ServerGuard, body: serde_json::Value, result: serde_json::Value) {
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(body))
            .with_body(json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string())
            .create_async()
            .await;
    }

    fn block_json(number: u64, tx_count: usize) -> serde_json::Value {
        let txs: Vec<_> = (0..tx_count)
            .map(|i| {
                json!({
                    "hash": format!("0x{:064x}", i + 1),
                    "nonce": "0x0",
                    "from": "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf",
                    "to": "0x3535353535353535353535353535353535353535",
                    "value": "0xde0b6b3a7640000",
                    "gas": "0x5208",
                    "gasPrice": "0x1",
                    "blockNumber": format!("{number:#x}")
                })
            })
            .collect();
        json!({
            "number": format!("{number:#x}"),
            "hash": format!("0x{:064x}", number),
            "timestamp": "0x0",
            "gasUsed": "0x5208",
            "gasLimit": "0x1c9c380",
            "transactions": txs
        })
    }

    fn sample_block(tx_count: usize) -> Block {
        serde_json::from_value(block_json(7, tx_count)).unwrap()
    }

    fn transfer_log(data: &str) -> serde_json::Value {
        json!({
            "address": TOKEN,
            "topics": [
                "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
                FROM_TOPIC,
                TO_TOPIC
            ],
            "data": data,
            "blockNumber": "0x65",
            "transactionHash": format!("0x{:064x}", 1),
            "logIndex": "0x0"
        })
    }

    #[test]
    fn block_summary_lists_first_three() {
        let out = describe_block(&sample_block(5));
        assert!(out.starts_with("Block #7 | 1970-01-01 00:00:00 UTC | 5 transactions"));
        assert_eq!(out.lines().filter(|l| l.starts_with("  0x")).count(), 3);
        assert!(out.contains("... and 2 more"));
        assert!(out.contains("-> 0x3535353535353535353535353535353535353535 1 ETH"));
    }

    #[test]
    fn empty_block_summary() {
        let out = describe_block(&sample_block(0));
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("0 transactions"));
    }

    #[test]
    fn transfer_summary_with_and_without_decimals() {
        let log = Log {
            address: TOKEN.parse().unwrap(),
            topics: vec![],
            data: Bytes::new(),
            block_number: Some(101),
            transaction_hash: None,
            log_index: None,
        };
        let event = TransferEvent {
            from: Address::ZERO,
            to: Address::repeat_byte(0x35),
            value: Amount::from(1_500_000u64),
        };

        let scaled = describe_transfer(&log, &event, Some(6));
        assert!(scaled.starts_with("[block 101] token 0xdAC17F958D2ee523a2206206994597C13D831ec7"));
        assert!(scaled.trim_end().ends_with("| 1.5"));

        let raw = describe_transfer(&log, &event, None);
        assert!(raw.trim_end().ends_with("| 1500000"));
    }

    #[tokio::test]
    async fn poll_blocks_delivers_range_in_order() {
        let mut server = mockito::Server::new_async().await;
        respond(&mut server, json!({ "method": "eth_blockNumber" }), json!("0xc")).await;
        for n in 10u64..=12 {
            respond(
                &mut server,
                json!({ "method": "eth_getBlockByNumber", "params": [format!("{n:#x}"), true] }),
                block_json(n, 1),
            )
            .await;
        }

        let provider = provider_for(&server);
        let mut cursor = BlockCursor::starting_at(10);
        let mut seen = Vec::new();
        let delivered = poll_blocks(&provider, &mut cursor, |b| seen.push(b.number))
            .await
            .unwrap();

        assert_eq!(delivered, 3);
        assert_eq!(seen, vec![10, 11, 12]);
        assert_eq!(cursor.next_block(), 13);
    }

    #[tokio::test]
    async fn poll_blocks_after_head_waits_for_next_block() {
        let mut server = mockito::Server::new_async().await;
        respond(&mut server, json!({ "method": "eth_blockNumber" }), json!("0xa")).await;
        let blocks = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "method": "eth_getBlockByNumber" })))
            .expect(0)
            .create_async()
            .await;

        let provider = provider_for(&server);
        let mut cursor = BlockCursor::after(10);
        let delivered = poll_blocks(&provider, &mut cursor, |_| {}).await.unwrap();
        assert_eq!(delivered, 0);
        assert_eq!(cursor.next_block(), 11);
        blocks.assert_async().await;
    }

    #[tokio::test]
    async fn poll_blocks_stops_at_missing_block() {
        let mut server = mockito::Server::new_async().await;
        respond(&mut server, json!({ "method": "eth_blockNumber" }), json!("0xb")).await;
        respond(
            &mut server,
            json!({ "method": "eth_getBlockByNumber", "params": ["0xa", true] }),
            block_json(10, 0),
        )
        .await;
        respond(
            &mut server,
            json!({ "method": "eth_getBlockByNumber", "params": ["0xb", true] }),
            json!(null),
        )
        .await;

        let provider = provider_for(&server);
        let mut cursor = BlockCursor::starting_at(10);
        let delivered = poll_blocks(&provider, &mut cursor, |_| {}).await.unwrap();
        assert_eq!(delivered, 1);
        assert_eq!(cursor.next_block(), 11);
    }

    #[tokio::test]
    async fn poll_blocks_failure_keeps_cursor() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let provider = provider_for(&server);
        let mut cursor = BlockCursor::starting_at(10);
        assert!(poll_blocks(&provider, &mut cursor, |_| {}).await.is_err());
        assert_eq!(cursor.next_block(), 10);
    }

    #[tokio::test]
    async fn poll_transfers_decodes_and_skips_non_erc20() {
        let mut server = mockito::Server::new_async().await;
        respond(&mut server, json!({ "method": "eth_blockNumber" }), json!("0x65")).await;

        let mut erc721 = transfer_log("0x");
        erc721["topics"]
            .as_array_mut()
            .unwrap()
            .push(json!(format!("0x{:064x}", 7)));
        let logs = json!([
            transfer_log("0x00000000000000000000000000000000000000000000000000000000000003e8"),
            erc721
        ]);
        respond(
            &mut server,
            json!({
                "method": "eth_getLogs",
                "params": [{
                    "fromBlock": "0x64",
                    "toBlock": "0x65",
                    "topics": ["0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"]
                }]
            }),
            logs,
        )
        .await;

        let provider = provider_for(&server);
        let mut cursor = BlockCursor::starting_at(100);
        let mut events = Vec::new();
        let delivered = poll_transfers(&provider, &mut cursor, None, |_, e| events.push(e.clone()))
            .await
            .unwrap();

        assert_eq!(delivered, 1);
        assert_eq!(events[0].value, Amount::from(1000u64));
        assert_eq!(events[0].to, Address::repeat_byte(0x35));
        assert_eq!(
            B256::left_padding_from(events[0].from.as_slice()),
            FROM_TOPIC.parse::<B256>().unwrap()
        );
        assert_eq!(cursor.next_block(), 102);
    }

    #[tokio::test]
    async fn poll_transfers_waits_for_new_blocks() {
        let mut server = mockito::Server::new_async().await;
        respond(&mut server, json!({ "method": "eth_blockNumber" }), json!("0x63")).await;

        let provider = provider_for(&server);
        let mut cursor = BlockCursor::starting_at(100);
        let delivered = poll_transfers(&provider, &mut cursor, None, |_, _| {})
            .await
            .unwrap();
        assert_eq!(delivered, 0);
        assert_eq!(cursor.next_block(), 100);
    }
}
