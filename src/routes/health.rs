pub async fn root() -> &'static str {
    "Server is running"
}
