#[tokio::main]
async fn main() -> anyhow::Result<()> {
    likes_server::start_server().await
}
