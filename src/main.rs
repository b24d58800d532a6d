use mexcx::core::config::ExchangeConfig;
use mexcx::core::types::{DomainEvent, KlineInterval, StreamEvent};
use mexcx::exchanges::mexc::{MexcBuilder, Subscription};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Credentials are optional; without them only public channels are streamed
    let config = ExchangeConfig::from_env("MEXC").unwrap_or_else(|_| ExchangeConfig::read_only());

    let (stream, mut events) = MexcBuilder::new().with_config(config).build();
    stream.connect().await?;
    println!("Connected, authenticated: {}", stream.is_authenticated());

    stream
        .subscribe(&[
            Subscription::deals(["BTC_USDT"]),
            Subscription::depth(["BTC_USDT"]),
            Subscription::klines(["BTC_USDT", "ETH_USDT"], KlineInterval::Minutes1),
        ])
        .await?;

    let mut received = 0;
    while let Some(event) = events.recv().await {
        match event {
            StreamEvent::Data(DomainEvent::Trades { symbol, trades }) => {
                for trade in trades {
                    println!(
                        "{} trade {:?} {} @ {}",
                        symbol, trade.side, trade.quantity, trade.price
                    );
                }
            }
            StreamEvent::Data(DomainEvent::OrderBook(book)) => {
                println!(
                    "{} book v{}: {} bids, {} asks",
                    book.symbol,
                    book.version,
                    book.bids.len(),
                    book.asks.len()
                );
            }
            StreamEvent::Data(other) => println!("{:?}", other),
            StreamEvent::Unhandled { channel, payload } => {
                println!("Unhandled {}: {}", channel, payload);
            }
            StreamEvent::Error(e) => println!("Stream error: {}", e),
        }

        received += 1;
        if received >= 20 {
            break;
        }
    }

    stream.close().await?;
    Ok(())
}
