#[tokio::main]
async fn main() -> anyhow::Result<()> {
    memberships_admin_lib::run(std::env::args().skip(1).collect()).await
}
