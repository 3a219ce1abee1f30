#[tokio::main]
async fn main() -> anyhow::Result<()> {
    payadmin::bootstrapper::run().await
}
