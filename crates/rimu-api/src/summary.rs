use std::collections::HashSet;

use crate::types::{DataCenter, Order, OrderSummary, PricingPlan};

/// Project an order onto the fields listings care about.
///
/// Missing source fields degrade to `""` (IP, data center) or `None`; a
/// just-created order without `allocated_ips` summarizes fine.
pub fn summarize(order: &Order) -> OrderSummary {
    OrderSummary {
        order_oid: order.order_oid,
        primary_ip: order.primary_ip().unwrap_or_default().to_string(),
        domain_name: order.domain_name.clone(),
        dc_location: order
            .location
            .as_ref()
            .and_then(|l| l.data_center_location_code.clone())
            .unwrap_or_default(),
        running_state: order.running_state.unwrap_or_default(),
        memory_mb: order.vps_parameters.as_ref().and_then(|p| p.memory_mb),
        order_description: order.order_description.clone(),
    }
}

/// Distinct data centers offered across `plans`, in first-seen order.
/// Entries without a location code are skipped.
pub fn data_centers(plans: &[PricingPlan]) -> Vec<DataCenter> {
    let mut seen = HashSet::new();
    plans
        .iter()
        .filter_map(|p| p.offered_at_data_center.as_ref())
        .filter(|dc| !dc.data_center_location_code.is_empty())
        .filter(|dc| seen.insert(dc.data_center_location_code.clone()))
        .cloned()
        .collect()
}
