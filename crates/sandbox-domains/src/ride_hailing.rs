//! Ride hailing domain
//!
//! Point-to-point cab rides. The fare is quoted on select as base fare plus
//! service tax; confirm assigns a driver and vehicle.

use sandbox_core::{ContextRecord, DomainConfig, GeneratorError, GeneratorInput, ResponseAction, ResponseGenerator};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::order::{
    at, carried_items, compact, find_by_id, find_offer_for_item, first_or, first_present, merge, now_millis,
    number_at, order_currency, order_total, price_specification, str_at, timestamp, PriceLine, Quote,
    DRAFT_CORE_CONTEXT,
};

/// Canonical domain identifier
pub const DOMAIN: &str = "beckn.one:mobility:ride-hailing:1.0";

/// Strings that resolve to this domain
pub const MATCH_PATTERNS: [&str; 4] = ["ride-hailing", "cab", "mobility:ride-hailing", "taxi"];

const SELLER_ID: &str = "provider-bangkok-cab-service";
const RIDE_CONTEXT: &str =
    "https://raw.githubusercontent.com/beckn/protocol-specifications-new/refs/heads/draft/schema/RideService/v1/context.jsonld";
const BOOKING_CONTEXT: &str =
    "https://raw.githubusercontent.com/beckn/protocol-specifications-new/refs/heads/draft/schema/RideBooking/v1/context.jsonld";

const DEFAULT_FARE: f64 = 18.0;
const DEFAULT_TOTAL: f64 = 18.5;
const SERVICE_TAX_PERCENT: f64 = 2.78;
const REROUTE_FACTOR: f64 = 1.1;

/// Fare quote: base fare plus service tax
pub fn quote(base_fare: f64, currency: &str) -> Quote {
    Quote::from_lines(
        currency,
        vec![
            PriceLine::new("UNIT", base_fare, "Base fare"),
            PriceLine::new(
                "TAX",
                base_fare * SERVICE_TAX_PERCENT / 100.0,
                format!("Service tax ({}%)", SERVICE_TAX_PERCENT),
            ),
        ],
    )
}

/// Response generators for ride hailing
#[derive(Debug, Clone, Default)]
pub struct RideHailingGenerator;

impl RideHailingGenerator {
    /// Create the generator set
    pub fn new() -> Self {
        Self
    }

    fn on_select(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let catalog = input.prior.and_then(ContextRecord::first_catalog);
        let item_id = at(request, "/beckn:orderItems/0/beckn:orderedItem");
        let item = find_by_id(at(catalog, "/beckn:items"), item_id);
        let offer = find_offer_for_item(at(catalog, "/beckn:offers"), item_id);

        let base_fare = number_at(offer, "/beckn:price/value")
            .or_else(|| number_at(item, "/beckn:price/value"))
            .unwrap_or(DEFAULT_FARE);
        let currency = str_at(offer, "/beckn:price/currency")
            .or_else(|| str_at(item, "/beckn:price/currency"))
            .unwrap_or("USD");
        let quote = quote(base_fare, currency);
        debug!(base_fare, total = quote.total, "Ride fare quoted");

        let ordered_item = first_or(&[item_id, at(item, "/beckn:id")], json!("item-cab-sedan"));
        let offer_id = first_or(
            &[at(offer, "/beckn:id")],
            json!(format!("offer-{}-base", item_id.and_then(Value::as_str).unwrap_or("cab"))),
        );
        let descriptor = match at(offer, "/beckn:descriptor") {
            Some(found) => {
                let mut descriptor = json!({ "@context": DRAFT_CORE_CONTEXT, "@type": "beckn:Descriptor" });
                merge(&mut descriptor, found);
                descriptor
            }
            None => json!({
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Descriptor",
                "schema:name": first_or(&[at(item, "/beckn:descriptor/schema:name")], json!("Sedan Cab - Airport to Hotel")),
                "beckn:shortDesc": "Standard sedan fare"
            }),
        };

        let mut attributes = first_or(&[at(item, "/beckn:itemAttributes")], json!({}));
        if let Some(fields) = attributes.as_object_mut() {
            fields.remove("ride:cancellationPolicy");
        }
        let attribute = |key: &str, fallback: Value| first_or(&[attributes.get(key).filter(|v| !v.is_null())], fallback);
        let delivery = at(request, "/beckn:fulfillment/beckn:deliveryAttributes");

        json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(request, "/beckn:id")], json!(format!("order-cab-{}", now_millis()))),
            "beckn:orderStatus": "QUOTE_REQUESTED",
            "beckn:seller": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Provider",
                "beckn:id": first_or(&[at(item, "/beckn:provider/beckn:id"), at(request, "/beckn:seller")], json!(SELLER_ID)),
                "beckn:descriptor": first_or(&[at(item, "/beckn:provider/beckn:descriptor")], json!({
                    "@type": "beckn:Descriptor",
                    "schema:name": "Bangkok Cab Service",
                    "beckn:shortDesc": "Reliable cab service in Bangkok"
                }))
            },
            "beckn:orderItems": [{
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:OrderItem",
                "beckn:lineId": first_or(&[at(request, "/beckn:orderItems/0/beckn:lineId")], json!("line-001")),
                "beckn:orderedItem": ordered_item,
                "beckn:acceptedOffer": {
                    "@context": DRAFT_CORE_CONTEXT,
                    "@type": "beckn:Offer",
                    "beckn:id": offer_id,
                    "beckn:descriptor": descriptor,
                    "beckn:price": price_specification(currency, base_fare, Vec::new())
                },
                "beckn:orderItemAttributes": {
                    "@context": RIDE_CONTEXT,
                    "@type": "beckn:RideService",
                    "ride:vehicleType": attribute("ride:vehicleType", json!("Sedan")),
                    "ride:vehicleCategory": attribute("ride:vehicleCategory", json!("Sedan")),
                    "ride:maxPassengers": attribute("ride:maxPassengers", json!(4)),
                    "ride:maxLuggage": attribute("ride:maxLuggage", json!(3)),
                    "ride:estimatedDistance": attribute("ride:estimatedDistance", json!(25)),
                    "ride:distanceUnit": attribute("ride:distanceUnit", json!("KM")),
                    "ride:estimatedDuration": attribute("ride:estimatedDuration", json!("PT40M")),
                    "ride:eta": attribute("ride:eta", json!("PT5M")),
                    "ride:amenities": attribute("ride:amenities", json!({
                        "airConditioning": true,
                        "wifi": true,
                        "charger": true,
                        "bottledWater": true
                    }))
                }
            }],
            "beckn:orderValue": quote.to_price_specification(),
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-ride-{}", now_millis())),
                ),
                "beckn:mode": "RESERVATION",
                "beckn:status": "QUOTED",
                "beckn:deliveryAttributes": {
                    "@context": RIDE_CONTEXT,
                    "@type": "beckn:RideDelivery",
                    "ride:type": "ride",
                    "ride:waitTime": first_or(&[at(item, "/beckn:itemAttributes/ride:eta")], json!("PT5M")),
                    "ride:start": fulfillment_point(at(delivery, "/ride:start"), None, pickup_default()),
                    "ride:end": fulfillment_point(at(delivery, "/ride:end"), None, dropoff_default())
                }
            }
        })
    }

    fn on_init(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let quoted = input.prior_order();
        let delivery = at(quoted, "/beckn:fulfillment/beckn:deliveryAttributes");
        let request_delivery = at(request, "/beckn:fulfillment/beckn:deliveryAttributes");

        compact(json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(quoted, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-cab-{}", now_millis()))),
            "beckn:orderStatus": "INITIALIZED",
            "beckn:seller": first_or(&[at(quoted, "/beckn:seller"), at(request, "/beckn:seller")], default_seller()),
            "beckn:buyer": first_present(&[at(request, "/beckn:buyer"), at(quoted, "/beckn:buyer")]),
            "beckn:orderItems": first_or(&[at(quoted, "/beckn:orderItems"), at(request, "/beckn:orderItems")], json!([])),
            "beckn:orderValue": carried_order_value(quoted),
            "beckn:payment": post_fulfillment_payment(quoted),
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id"), at(quoted, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-ride-{}", now_millis())),
                ),
                "beckn:mode": "RESERVATION",
                "beckn:status": "PENDING",
                "beckn:deliveryAttributes": {
                    "@context": RIDE_CONTEXT,
                    "@type": "beckn:RideDelivery",
                    "ride:type": "ride",
                    "ride:waitTime": first_or(&[at(delivery, "/ride:waitTime")], json!("PT5M")),
                    "ride:start": fulfillment_point(at(request_delivery, "/ride:start"), at(delivery, "/ride:start"), pickup_default()),
                    "ride:end": fulfillment_point(at(request_delivery, "/ride:end"), at(delivery, "/ride:end"), dropoff_default())
                }
            }
        }))
    }

    fn on_confirm(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let initialized = input.prior_order();
        let delivery = at(initialized, "/beckn:fulfillment/beckn:deliveryAttributes");
        let request_delivery = at(request, "/beckn:fulfillment/beckn:deliveryAttributes");
        let otp = format!("{}", 1000 + rand::random::<u16>() % 9000);

        compact(json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(initialized, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-cab-{}", now_millis()))),
            "beckn:orderStatus": "CONFIRMED",
            "beckn:seller": first_or(&[at(initialized, "/beckn:seller"), at(request, "/beckn:seller")], default_seller()),
            "beckn:buyer": first_present(&[at(request, "/beckn:buyer"), at(initialized, "/beckn:buyer")]),
            "beckn:orderItems": first_or(&[at(initialized, "/beckn:orderItems"), at(request, "/beckn:orderItems")], json!([])),
            "beckn:orderValue": carried_order_value(initialized),
            "beckn:payment": post_fulfillment_payment(initialized),
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(&[at(initialized, "/beckn:fulfillment/beckn:id")], json!(format!("fulfillment-ride-{}", now_millis()))),
                "beckn:mode": "RESERVATION",
                "beckn:status": "CONFIRMED",
                "beckn:deliveryAttributes": {
                    "@context": RIDE_CONTEXT,
                    "@type": "beckn:RideDelivery",
                    "ride:type": "ride",
                    "ride:state": "DRIVER_ASSIGNED",
                    "ride:waitTime": first_or(&[at(delivery, "/ride:waitTime")], json!("PT5M")),
                    "ride:authorization": {
                        "@type": "beckn:Authorization",
                        "beckn:type": "OTP",
                        "beckn:token": otp
                    },
                    "ride:agent": {
                        "@context": DRAFT_CORE_CONTEXT,
                        "@type": "beckn:Agent",
                        "beckn:id": format!("driver-{}", now_millis()),
                        "schema:name": "Somchai K.",
                        "schema:telephone": "+66 987 654 321",
                        "beckn:rating": { "@type": "beckn:Rating", "beckn:ratingValue": 4.8, "beckn:ratingCount": 1247 }
                    },
                    "ride:vehicle": {
                        "@context": DRAFT_CORE_CONTEXT,
                        "@type": "beckn:Vehicle",
                        "beckn:id": format!("vehicle-{}", now_millis()),
                        "beckn:descriptor": { "@type": "beckn:Descriptor", "schema:name": "Toyota Camry", "beckn:code": "BKK-1234" },
                        "beckn:category": "Sedan",
                        "beckn:color": "Black",
                        "beckn:registrationNumber": "BKK-1234"
                    },
                    "ride:start": fulfillment_point(at(request_delivery, "/ride:start"), at(delivery, "/ride:start"), pickup_default()),
                    "ride:end": fulfillment_point(at(request_delivery, "/ride:end"), at(delivery, "/ride:end"), dropoff_default())
                }
            },
            "beckn:orderAttributes": {
                "@context": BOOKING_CONTEXT,
                "@type": "beckn:RideBooking",
                "bookingId": format!("RIDE-BKK-{}", now_millis()),
                "bookingReference": format!("BCS-{}", now_millis()),
                "rideStatus": "DRIVER_ASSIGNED",
                "confirmedAt": timestamp()
            }
        }))
    }

    fn on_status(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let confirmed = input.prior_order();
        let delivery = at(confirmed, "/beckn:fulfillment/beckn:deliveryAttributes");
        let ride_status = str_at(confirmed, "/beckn:orderAttributes/rideStatus").unwrap_or("IN_PROGRESS");
        let ride_state = str_at(delivery, "/ride:state").unwrap_or("IN_PROGRESS");
        let carried = |key: &str| first_or(&[at(delivery, key)], json!({}));

        let mut attributes = first_or(&[at(confirmed, "/beckn:orderAttributes")], json!({}));
        merge(&mut attributes, &json!({ "rideStatus": ride_status }));
        match ride_status {
            "IN_PROGRESS" => merge(
                &mut attributes,
                &json!({
                    "currentLocation": { "type": "Point", "coordinates": [100.65, 13.72] },
                    "distanceTraveled": 12.5,
                    "estimatedTimeToDestination": "PT25M"
                }),
            ),
            "COMPLETED" => merge(
                &mut attributes,
                &json!({
                    "actualDistance": 25.3,
                    "actualDuration": "PT38M",
                    "invoice": {
                        "invoiceNumber": format!("INV-BKK-{}", now_millis()),
                        "invoiceDate": timestamp(),
                        "totalAmount": order_total(confirmed).unwrap_or(DEFAULT_TOTAL),
                        "currency": order_currency(confirmed).unwrap_or("USD")
                    }
                }),
            ),
            _ => {}
        }

        compact(json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(confirmed, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-cab-{}", now_millis()))),
            "beckn:orderStatus": if ride_status == "COMPLETED" { "COMPLETED" } else { "IN_PROGRESS" },
            "beckn:seller": first_or(&[at(confirmed, "/beckn:seller")], default_seller()),
            "beckn:buyer": first_present(&[at(confirmed, "/beckn:buyer")]),
            "beckn:orderItems": carried_items(None, confirmed),
            "beckn:orderValue": carried_order_value(confirmed),
            "beckn:payment": first_or(&[at(confirmed, "/beckn:payment")], post_fulfillment_payment(None)),
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(&[at(confirmed, "/beckn:fulfillment/beckn:id")], json!(format!("fulfillment-ride-{}", now_millis()))),
                "beckn:mode": "RESERVATION",
                "beckn:status": first_or(&[at(confirmed, "/beckn:fulfillment/beckn:status")], json!("CONFIRMED")),
                "beckn:deliveryAttributes": {
                    "@context": RIDE_CONTEXT,
                    "@type": "beckn:RideDelivery",
                    "ride:type": "ride",
                    "ride:state": ride_state,
                    "ride:waitTime": if ride_state == "COMPLETED" {
                        json!("PT0M")
                    } else {
                        first_or(&[at(delivery, "/ride:waitTime")], json!("PT0M"))
                    },
                    "ride:authorization": carried("/ride:authorization"),
                    "ride:agent": carried("/ride:agent"),
                    "ride:vehicle": carried("/ride:vehicle"),
                    "ride:start": carried("/ride:start"),
                    "ride:end": carried("/ride:end")
                }
            },
            "beckn:orderAttributes": attributes
        }))
    }

    fn on_update(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let confirmed = input.prior_order();
        let delivery = at(confirmed, "/beckn:fulfillment/beckn:deliveryAttributes");
        let new_destination = at(request, "/beckn:fulfillment/beckn:end/beckn:location")
            .or_else(|| at(request, "/beckn:fulfillment/beckn:deliveryAttributes/ride:end/beckn:location"));

        let base_fare = number_at(confirmed, "/beckn:orderItems/0/beckn:acceptedOffer/beckn:price/schema:price")
            .unwrap_or(DEFAULT_FARE);
        let currency = order_currency(confirmed).unwrap_or("USD");
        let mut fare = quote(
            if new_destination.is_some() { base_fare * REROUTE_FACTOR } else { base_fare },
            currency,
        );
        if new_destination.is_some() {
            fare.lines[0].description = "Base fare (updated)".to_string();
        }

        let order_value = fare.to_price_specification();
        let payment = post_fulfillment_payment(Some(&json!({ "beckn:orderValue": order_value.clone() })));
        let mut end = first_or(&[at(delivery, "/ride:end")], dropoff_default());
        if let Some(location) = new_destination {
            merge(&mut end, &json!({ "beckn:location": location }));
        }

        let mut attributes = first_or(&[at(confirmed, "/beckn:orderAttributes")], json!({}));
        merge(&mut attributes, &json!({ "rideStatus": "IN_PROGRESS", "updatedAt": timestamp() }));

        compact(json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(confirmed, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-cab-{}", now_millis()))),
            "beckn:orderStatus": "IN_PROGRESS",
            "beckn:seller": first_or(&[at(confirmed, "/beckn:seller"), at(request, "/beckn:seller")], default_seller()),
            "beckn:buyer": first_present(&[at(request, "/beckn:buyer"), at(confirmed, "/beckn:buyer")]),
            "beckn:orderItems": carried_items(None, confirmed),
            "beckn:orderValue": order_value,
            "beckn:payment": payment,
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(&[at(confirmed, "/beckn:fulfillment/beckn:id")], json!(format!("fulfillment-ride-{}", now_millis()))),
                "beckn:mode": "RESERVATION",
                "beckn:status": "CONFIRMED",
                "beckn:deliveryAttributes": {
                    "@context": RIDE_CONTEXT,
                    "@type": "beckn:RideDelivery",
                    "ride:type": "ride",
                    "ride:state": "IN_PROGRESS",
                    "ride:agent": first_or(&[at(delivery, "/ride:agent")], json!({})),
                    "ride:vehicle": first_or(&[at(delivery, "/ride:vehicle")], json!({})),
                    "ride:start": first_or(&[at(delivery, "/ride:start")], pickup_default()),
                    "ride:end": end
                }
            },
            "beckn:orderAttributes": attributes
        }))
    }

    fn on_cancel(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let confirmed = input.prior_order();
        let delivery = at(confirmed, "/beckn:fulfillment/beckn:deliveryAttributes");
        let order_value = carried_order_value(confirmed);
        let total = number_at(Some(&order_value), "/schema:price").unwrap_or(0.0);
        let currency = str_at(Some(&order_value), "/schema:priceCurrency").unwrap_or("USD").to_string();

        // Cancellations inside the free window carry no fee; the full fare
        // is offset by a discount line
        let fee = 0.0;
        let mut components = first_or(&[at(Some(&order_value), "/beckn:components")], json!([]));
        if let Some(lines) = components.as_array_mut() {
            lines.push(json!({
                "@type": "beckn:PriceComponent",
                "beckn:type": "DISCOUNT",
                "beckn:value": -total,
                "beckn:currency": currency,
                "beckn:description": "Cancellation within free window - no charge"
            }));
        }
        let carried = |key: &str| first_or(&[at(delivery, key)], json!({}));

        compact(json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(confirmed, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-cab-{}", now_millis()))),
            "beckn:orderStatus": "CANCELLED",
            "beckn:seller": first_or(&[at(confirmed, "/beckn:seller"), at(request, "/beckn:seller")], default_seller()),
            "beckn:buyer": first_present(&[at(request, "/beckn:buyer"), at(confirmed, "/beckn:buyer")]),
            "beckn:orderItems": carried_items(request, confirmed),
            "beckn:orderValue": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "schema:PriceSpecification",
                "schema:priceCurrency": currency,
                "schema:price": fee,
                "beckn:components": components
            },
            "beckn:payment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Payment",
                "beckn:type": "POST_FULFILLMENT",
                "beckn:status": "NOT_PAID",
                "beckn:amount": { "@type": "schema:PriceSpecification", "schema:priceCurrency": currency, "schema:price": fee },
                "beckn:params": { "currency": currency, "amount": format!("{:.2}", fee) }
            },
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id"), at(confirmed, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-ride-{}", now_millis())),
                ),
                "beckn:mode": "RESERVATION",
                "beckn:status": "CANCELLED",
                "beckn:deliveryAttributes": {
                    "@context": RIDE_CONTEXT,
                    "@type": "beckn:RideDelivery",
                    "ride:type": "ride",
                    "ride:state": "CANCELLED",
                    "ride:agent": carried("/ride:agent"),
                    "ride:vehicle": carried("/ride:vehicle"),
                    "ride:start": carried("/ride:start"),
                    "ride:end": carried("/ride:end")
                }
            },
            "beckn:orderAttributes": {
                "@context": BOOKING_CONTEXT,
                "@type": "beckn:RideBooking",
                "bookingId": first_or(&[at(confirmed, "/beckn:orderAttributes/bookingId")], json!(format!("RIDE-BKK-{}", now_millis()))),
                "bookingReference": first_or(&[at(confirmed, "/beckn:orderAttributes/bookingReference")], json!(format!("BCS-{}", now_millis()))),
                "rideStatus": "CANCELLED",
                "cancellationTime": timestamp(),
                "cancellationReason": "Customer cancelled within free cancellation window",
                "cancellationFee": fee
            }
        }))
    }

    fn on_track(&self, input: &GeneratorInput<'_>) -> Value {
        let order_id = first_or(
            &[at(input.prior_order(), "/beckn:id"), at(input.order(), "/beckn:id")],
            json!(format!("order-cab-{}", now_millis())),
        );
        let order_id = order_id.as_str().map(str::to_string).unwrap_or_else(|| order_id.to_string());
        json!({
            "tracking": {
                "url": format!("https://track.bangkokcabs.com/ride/{}", order_id),
                "status": "active",
                "tl_method": "http/get"
            }
        })
    }

    fn on_rating(&self, input: &GeneratorInput<'_>) -> Value {
        let order_id = str_at(Some(input.message), "/id")
            .map(str::to_string)
            .unwrap_or_else(|| format!("order-cab-{}", now_millis()));
        json!({
            "received": true,
            "aggregate": { "ratingValue": 4.8, "ratingCount": 1248 },
            "feedbackForm": {
                "url": format!("https://bangkokcabs.com/feedback/{}", order_id),
                "mimeType": "text/html"
            }
        })
    }

    fn on_support(&self) -> Value {
        json!({
            "support": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:SupportInfo",
                "phone": "+66 2 555 1234",
                "email": "support@bangkokcabs.com",
                "url": "https://bangkokcabs.com/support"
            }
        })
    }
}

impl ResponseGenerator for RideHailingGenerator {
    fn supports(&self, action: ResponseAction) -> bool {
        action != ResponseAction::OnDiscover
    }

    fn generate(&self, action: ResponseAction, input: &GeneratorInput<'_>) -> Result<Value, GeneratorError> {
        let body = match action {
            ResponseAction::OnSelect => self.on_select(input),
            ResponseAction::OnInit => self.on_init(input),
            ResponseAction::OnConfirm => self.on_confirm(input),
            ResponseAction::OnStatus => self.on_status(input),
            ResponseAction::OnUpdate => self.on_update(input),
            ResponseAction::OnCancel => self.on_cancel(input),
            ResponseAction::OnTrack => self.on_track(input),
            ResponseAction::OnRating => self.on_rating(input),
            ResponseAction::OnSupport => self.on_support(),
            ResponseAction::OnDiscover => return Err(GeneratorError::Unsupported(action)),
        };
        Ok(body)
    }
}

/// Domain configuration for registration
pub fn config() -> DomainConfig {
    DomainConfig::new(DOMAIN, Arc::new(RideHailingGenerator::new())).with_patterns(MATCH_PATTERNS)
}

fn default_seller() -> Value {
    json!({
        "@context": DRAFT_CORE_CONTEXT,
        "@type": "beckn:Provider",
        "beckn:id": SELLER_ID,
        "beckn:descriptor": {
            "@type": "beckn:Descriptor",
            "schema:name": "Bangkok Cab Service",
            "beckn:shortDesc": "Reliable cab service in Bangkok",
            "schema:telephone": "+66 2 555 1234",
            "schema:email": "support@bangkokcabs.com"
        }
    })
}

fn carried_order_value(prior: Option<&Value>) -> Value {
    first_or(
        &[at(prior, "/beckn:orderValue")],
        price_specification("USD", DEFAULT_TOTAL, Vec::new()),
    )
}

fn post_fulfillment_payment(prior: Option<&Value>) -> Value {
    let currency = order_currency(prior).unwrap_or("USD");
    let amount = order_total(prior).unwrap_or(DEFAULT_TOTAL);
    json!({
        "@context": DRAFT_CORE_CONTEXT,
        "@type": "beckn:Payment",
        "beckn:type": "POST_FULFILLMENT",
        "beckn:status": "NOT_PAID",
        "beckn:amount": { "@type": "schema:PriceSpecification", "schema:priceCurrency": currency, "schema:price": amount },
        "beckn:params": { "currency": currency, "amount": format!("{:.2}", amount) }
    })
}

/// Pickup or dropoff point: request values first, then the prior order's
fn fulfillment_point(request: Option<&Value>, prior: Option<&Value>, fallback: Value) -> Value {
    let fallback_location = fallback.get("beckn:location");
    let field = |key: &str| {
        first_or(
            &[
                at(request, &format!("/beckn:location/{}", key)),
                at(prior, &format!("/beckn:location/{}", key)),
                fallback_location.and_then(|l| l.get(key)),
            ],
            Value::Null,
        )
    };
    let mut point = json!({
        "@type": "beckn:FulfillmentPoint",
        "beckn:location": compact(json!({
            "@type": "beckn:Location",
            "beckn:id": field("beckn:id"),
            "beckn:descriptor": field("beckn:descriptor"),
            "beckn:address": field("beckn:address"),
            "beckn:geo": field("beckn:geo"),
        }))
    });
    if let Some(time) = at(request, "/beckn:time").or_else(|| at(prior, "/beckn:time")).or_else(|| fallback.get("beckn:time")) {
        merge(&mut point, &json!({ "beckn:time": time }));
    }
    point
}

fn pickup_default() -> Value {
    json!({
        "beckn:location": {
            "beckn:id": "pickup-airport",
            "beckn:descriptor": { "@type": "beckn:Descriptor", "schema:name": "Suvarnabhumi Airport - Arrivals Hall" },
            "beckn:address": {
                "@type": "schema:PostalAddress",
                "schema:streetAddress": "999 Moo 1, Nong Prue",
                "schema:addressLocality": "Bang Phli",
                "schema:addressRegion": "Samut Prakan",
                "schema:postalCode": "10540",
                "schema:addressCountry": "TH"
            },
            "beckn:geo": { "type": "Point", "coordinates": [100.7501, 13.69] }
        },
        "beckn:time": { "@type": "beckn:TimePeriod", "schema:startDate": "2025-12-10T10:00:00+07:00" }
    })
}

fn dropoff_default() -> Value {
    json!({
        "beckn:location": {
            "beckn:id": "dropoff-hotel",
            "beckn:descriptor": { "@type": "beckn:Descriptor", "schema:name": "Grand Siam Hotel" },
            "beckn:address": {
                "@type": "schema:PostalAddress",
                "schema:streetAddress": "123 Sukhumvit Road",
                "schema:addressLocality": "Khlong Toei",
                "schema:addressRegion": "Bangkok",
                "schema:postalCode": "10110",
                "schema:addressCountry": "TH"
            },
            "beckn:geo": { "type": "Point", "coordinates": [100.5698, 13.7563] }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox_core::ProtocolContext;

    fn generate(action: ResponseAction, message: Value, prior: Option<&ContextRecord>) -> Value {
        let context = ProtocolContext::default();
        let input = GeneratorInput {
            message: &message,
            context: &context,
            prior,
        };
        RideHailingGenerator::new().generate(action, &input).unwrap()
    }

    fn confirmed(order: Value) -> ContextRecord {
        ContextRecord::new(DOMAIN, "on_confirm", json!({ "message": { "order": order } }), Value::Null)
    }

    #[test]
    fn test_quote_adds_service_tax() {
        let fare = quote(18.0, "USD");
        assert_eq!(fare.total, 18.5);
        assert_eq!(fare.lines[1].value, 0.5);
    }

    #[test]
    fn test_select_defaults_without_catalog() {
        let order = generate(ResponseAction::OnSelect, json!({ "order": {} }), None);

        assert_eq!(order["beckn:orderStatus"], "QUOTE_REQUESTED");
        assert_eq!(order["beckn:seller"]["beckn:id"], SELLER_ID);
        assert_eq!(order["beckn:orderValue"]["schema:price"], 18.5);
        assert_eq!(order["beckn:orderValue"]["schema:priceCurrency"], "USD");
        let start = &order["beckn:fulfillment"]["beckn:deliveryAttributes"]["ride:start"];
        assert_eq!(start["beckn:location"]["beckn:id"], "pickup-airport");
    }

    #[test]
    fn test_select_prices_from_matching_offer() {
        let discovery = json!({ "message": { "catalogs": [{
            "beckn:items": [{ "beckn:id": "suv", "beckn:itemAttributes": { "ride:vehicleType": "SUV", "ride:cancellationPolicy": {} } }],
            "beckn:offers": [
                { "beckn:id": "o-sedan", "beckn:items": ["sedan"], "beckn:price": { "value": 18.0, "currency": "USD" } },
                { "beckn:id": "o-suv", "beckn:items": ["suv"], "beckn:price": { "value": 40.0, "currency": "THB" } }
            ]
        }]}});
        let prior = ContextRecord::new(DOMAIN, "on_discover", discovery, Value::Null);
        let message = json!({ "order": { "beckn:orderItems": [{ "beckn:orderedItem": "suv" }] } });

        let order = generate(ResponseAction::OnSelect, message, Some(&prior));

        let item = &order["beckn:orderItems"][0];
        assert_eq!(item["beckn:acceptedOffer"]["beckn:id"], "o-suv");
        assert_eq!(item["beckn:orderItemAttributes"]["ride:vehicleType"], "SUV");
        assert!(item["beckn:orderItemAttributes"].get("ride:cancellationPolicy").is_none());
        assert_eq!(order["beckn:orderValue"]["schema:priceCurrency"], "THB");
        // 40 + 2.78%
        assert_eq!(order["beckn:orderValue"]["schema:price"], 41.11);
    }

    #[test]
    fn test_confirm_assigns_driver() {
        let order = generate(ResponseAction::OnConfirm, json!({}), None);
        let delivery = &order["beckn:fulfillment"]["beckn:deliveryAttributes"];

        assert_eq!(order["beckn:orderStatus"], "CONFIRMED");
        assert_eq!(delivery["ride:state"], "DRIVER_ASSIGNED");
        assert_eq!(delivery["ride:authorization"]["beckn:token"].as_str().unwrap().len(), 4);
        assert_eq!(order["beckn:orderAttributes"]["rideStatus"], "DRIVER_ASSIGNED");
    }

    #[test]
    fn test_status_follows_ride_status() {
        let in_progress = generate(ResponseAction::OnStatus, json!({}), None);
        assert_eq!(in_progress["beckn:orderStatus"], "IN_PROGRESS");
        assert_eq!(in_progress["beckn:orderAttributes"]["distanceTraveled"], 12.5);

        let prior = confirmed(json!({ "beckn:orderAttributes": { "rideStatus": "COMPLETED" } }));
        let completed = generate(ResponseAction::OnStatus, json!({}), Some(&prior));
        assert_eq!(completed["beckn:orderStatus"], "COMPLETED");
        assert_eq!(completed["beckn:orderAttributes"]["invoice"]["totalAmount"], 18.5);
    }

    #[test]
    fn test_update_reprices_new_destination() {
        let prior = confirmed(json!({
            "beckn:orderItems": [{ "beckn:acceptedOffer": { "beckn:price": { "schema:price": 20.0 } } }],
            "beckn:orderValue": { "schema:priceCurrency": "USD", "schema:price": 20.56 }
        }));
        let message = json!({ "order": { "beckn:fulfillment": { "beckn:end": { "beckn:location": { "beckn:id": "new-drop" } } } } });

        let order = generate(ResponseAction::OnUpdate, message, Some(&prior));

        assert_eq!(order["beckn:orderStatus"], "IN_PROGRESS");
        assert_eq!(order["beckn:orderValue"]["beckn:components"][0]["beckn:value"], 22.0);
        let end = &order["beckn:fulfillment"]["beckn:deliveryAttributes"]["ride:end"];
        assert_eq!(end["beckn:location"]["beckn:id"], "new-drop");
    }

    #[test]
    fn test_cancel_within_free_window_is_free() {
        let order = generate(ResponseAction::OnCancel, json!({}), None);
        assert_eq!(order["beckn:orderStatus"], "CANCELLED");
        assert_eq!(order["beckn:orderValue"]["schema:price"], 0.0);
        assert_eq!(order["beckn:orderAttributes"]["cancellationFee"], 0.0);
        let components = order["beckn:orderValue"]["beckn:components"].as_array().unwrap();
        assert_eq!(components.last().unwrap()["beckn:value"], -18.5);
    }

    #[test]
    fn test_track_returns_tracking_object() {
        let prior = confirmed(json!({ "beckn:id": "order-cab-7" }));
        let body = generate(ResponseAction::OnTrack, json!({}), Some(&prior));
        assert_eq!(body["tracking"]["url"], "https://track.bangkokcabs.com/ride/order-cab-7");
        assert_eq!(body["tracking"]["status"], "active");
        assert_eq!(body["tracking"]["tl_method"], "http/get");
    }

    #[test]
    fn test_rating_uses_message_id() {
        let body = generate(ResponseAction::OnRating, json!({ "id": "order-cab-9", "value": 5 }), None);
        assert_eq!(body["received"], true);
        assert_eq!(body["feedbackForm"]["url"], "https://bangkokcabs.com/feedback/order-cab-9");
    }
}
