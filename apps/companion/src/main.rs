#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    medrecap_companion::run().await
}
