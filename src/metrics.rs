use once_cell::sync::Lazy;
use prometheus::{Counter, Encoder, Opts, Registry, TextEncoder};

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static REQUEST_COUNTER: Lazy<Counter> = Lazy::new(|| {
    let opts = Opts::new("bitsa_requests_total", "Total number of requests received");
    let c = Counter::with_opts(opts).unwrap();
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

pub fn gather_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let mf = REGISTRY.gather();
    encoder.encode(&mf, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
