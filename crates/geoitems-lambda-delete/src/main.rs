#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    geoitems_lambda_delete::run().await
}
