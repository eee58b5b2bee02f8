// Handlers interleave only at await points.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    linkline_server::run().await
}
