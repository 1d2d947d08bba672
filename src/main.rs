#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    ecd_report_server::run().await
}
