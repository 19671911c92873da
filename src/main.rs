#[tokio::main]
async fn main() -> anyhow::Result<()> {
    reminder::bootstrapper::run().await
}
