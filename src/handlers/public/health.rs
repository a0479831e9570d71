// GET /healthz - constant liveness response; touches no dependencies

pub async fn healthz() -> &'static str {
    "hi."
}
