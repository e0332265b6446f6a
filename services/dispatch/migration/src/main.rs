use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(courier_dispatch_migration::Migrator).await;
}
