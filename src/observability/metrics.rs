use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_created_total: IntCounter,
    pub order_transitions_total: IntCounterVec,
    pub chat_messages_total: IntCounter,
    pub open_orders: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_created_total =
            IntCounter::new("orders_created_total", "Total orders created by clients")
                .expect("valid orders_created_total metric");

        let order_transitions_total = IntCounterVec::new(
            Opts::new("order_transitions_total", "Order status transitions by action"),
            &["action"],
        )
        .expect("valid order_transitions_total metric");

        let chat_messages_total =
            IntCounter::new("chat_messages_total", "Total chat messages sent")
                .expect("valid chat_messages_total metric");

        let open_orders = IntGauge::new(
            "open_orders",
            "Orders not yet completed or cancelled",
        )
        .expect("valid open_orders metric");

        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("register orders_created_total");
        registry
            .register(Box::new(order_transitions_total.clone()))
            .expect("register order_transitions_total");
        registry
            .register(Box::new(chat_messages_total.clone()))
            .expect("register chat_messages_total");
        registry
            .register(Box::new(open_orders.clone()))
            .expect("register open_orders");

        Self {
            registry,
            orders_created_total,
            order_transitions_total,
            chat_messages_total,
            open_orders,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
