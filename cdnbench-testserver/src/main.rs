use std::net::SocketAddr;
use std::time::Duration;

use cdnbench_testserver::{StatusCode, TestServerOptions, TestServerStats};
use tokio::net::TcpListener;

const USAGE: &str = "cdnbench-testserver\n\nUSAGE:\n  cdnbench-testserver [--bind 127.0.0.1:0] [--delay-ms N] [--status CODE]\n\nOUTPUT:\n  Prints HTTP_URL=<url> to stdout once ready.";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut bind_addr: SocketAddr = "127.0.0.1:0".parse()?;
    let mut opts = TestServerOptions::default();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bind" => {
                let addr = args.next().ok_or_else(|| {
                    anyhow::anyhow!("--bind requires an address, e.g. 127.0.0.1:0")
                })?;
                bind_addr = addr.parse()?;
            }
            "--delay-ms" => {
                let ms = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--delay-ms requires a number"))?;
                opts = opts.with_delay(Duration::from_millis(ms.parse()?));
            }
            "--status" => {
                let code = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--status requires an HTTP status code"))?;
                opts = opts.with_status(StatusCode::from_u16(code.parse()?)?);
            }
            "-h" | "--help" => {
                eprintln!("{USAGE}");
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("unknown argument: {other}"));
            }
        }
    }

    let listener = TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    let app = cdnbench_testserver::router(TestServerStats::default(), opts);

    println!("HTTP_URL=http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
