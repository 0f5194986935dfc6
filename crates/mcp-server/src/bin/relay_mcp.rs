use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    relay_mcp::main_entry().await
}
