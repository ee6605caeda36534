//! EV charging domain
//!
//! Charging sessions sold by a charge point operator. Prices are INR per kWh;
//! the session quote is built on select and carried through every later
//! response.

use chrono::Duration;
use sandbox_core::{ContextRecord, DomainConfig, GeneratorError, GeneratorInput, ResponseAction, ResponseGenerator};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::order::{
    at, carried_items, compact, find_by_id, first_or, first_present, merge, millis_suffix, now_millis, number_at,
    timestamp, timestamp_in, PriceLine, Quote, CORE_CONTEXT,
};

/// Canonical domain identifier
pub const DOMAIN: &str = "beckn.one:energy:ev-charging";

/// Strings that resolve to this domain
pub const MATCH_PATTERNS: [&str; 4] = ["ev-charging", "energy:ev", "EV-CHARGING", "beckn.one:deg:ev-charging"];

const SELLER: &str = "ecopower-charging";
const SESSION_CONTEXT: &str =
    "https://raw.githubusercontent.com/beckn/protocol-specifications-new/refs/heads/main/schema/EvChargingSession/v1/context.jsonld";
const OFFER_CONTEXT: &str =
    "https://raw.githubusercontent.com/beckn/protocol-specifications-new/refs/heads/main/schema/EvChargingOffer/v1/context.jsonld";
const PAYMENT_URL: &str =
    "https://payments.bluechargenet-aggregator.io/pay?transaction_id=$transaction_id&amount=$amount";
const TRACKING_BASE: &str = "https://track.bluechargenet-aggregator.io/session";
const OTP_HINT: &str = "OTP will be shared to the user's registered number to confirm order";

const DEFAULT_QUANTITY_KWH: f64 = 2.5;
const DEFAULT_UNIT_PRICE: f64 = 18.0;
const DEFAULT_TOTAL: f64 = 128.64;
const SURCHARGE_PERCENT: f64 = 20.0;
const DISCOUNT_PERCENT: f64 = 15.0;
const SERVICE_FEE: f64 = 10.0;
const OVERCHARGE_ESTIMATE: f64 = 13.64;

/// Session quote: base (snapped to 100 when within 90..=110) plus surge,
/// minus offer discount, plus service fee and overcharge estimate
pub fn quote(quantity: f64, unit_price: f64, currency: &str) -> Quote {
    let calculated = quantity * unit_price;
    let base = if (90.0..=110.0).contains(&calculated) { 100.0 } else { calculated };

    Quote::from_lines(
        currency,
        vec![
            PriceLine::new("UNIT", base, format!("Base charging session cost ({:.0} {})", base, currency)),
            PriceLine::new(
                "SURCHARGE",
                base * SURCHARGE_PERCENT / 100.0,
                format!("Surge price ({}%)", SURCHARGE_PERCENT),
            ),
            PriceLine::new(
                "DISCOUNT",
                -(base * DISCOUNT_PERCENT / 100.0),
                format!("Offer discount ({}%)", DISCOUNT_PERCENT),
            ),
            PriceLine::new("FEE", SERVICE_FEE, "Service fee"),
            PriceLine::new("FEE", OVERCHARGE_ESTIMATE, "Overcharge estimation"),
        ],
    )
}

/// Response generators for EV charging
#[derive(Debug, Clone, Default)]
pub struct EvChargingGenerator;

impl EvChargingGenerator {
    /// Create the generator set
    pub fn new() -> Self {
        Self
    }

    fn on_select(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let catalog = input.prior.and_then(ContextRecord::first_catalog);
        let line = at(request, "/beckn:orderItems/0");
        let item_id = at(line, "/beckn:orderedItem");
        let offer_id = at(line, "/beckn:acceptedOffer/beckn:id");

        let item = find_by_id(at(catalog, "/beckn:items"), item_id);
        let catalog_offer = find_by_id(at(catalog, "/beckn:offers"), offer_id);
        let request_offer = at(line, "/beckn:acceptedOffer");

        let pick = |key: &str, fallback: Value| first_or(&[at(request_offer, key), at(catalog_offer, key)], fallback);
        let mut offer = json!({});
        for source in [catalog_offer, request_offer].into_iter().flatten() {
            merge(&mut offer, source);
        }
        let ordered_item = first_or(&[item_id, at(item, "/beckn:id")], json!("ev-charger-ccs2-001"));
        let merged = json!({
            "@context": pick("/@context", json!(CORE_CONTEXT)),
            "@type": "beckn:Offer",
            "beckn:id": first_or(&[at(request_offer, "/beckn:id"), at(catalog_offer, "/beckn:id"), offer_id], json!("offer-ccs2-60kw-kwh")),
            "beckn:descriptor": pick("/beckn:descriptor", json!({
                "@type": "beckn:Descriptor",
                "schema:name": "Per-kWh Tariff - CCS2 60kW"
            })),
            "beckn:items": pick("/beckn:items", json!([ordered_item.clone()])),
            "beckn:provider": first_or(
                &[at(request_offer, "/beckn:provider"), at(catalog_offer, "/beckn:provider"), at(item, "/beckn:provider/beckn:id")],
                json!(SELLER),
            ),
            "beckn:price": pick("/beckn:price", json!({
                "currency": "INR",
                "value": DEFAULT_UNIT_PRICE,
                "applicableQuantity": { "unitText": "Kilowatt Hour", "unitCode": "KWH", "unitQuantity": 1 }
            })),
            "beckn:validity": pick("/beckn:validity", json!({
                "@type": "beckn:TimePeriod",
                "schema:startDate": timestamp(),
                "schema:endDate": timestamp_in(Duration::days(90))
            })),
            "beckn:acceptedPaymentMethod": pick("/beckn:acceptedPaymentMethod", json!(["UPI", "CREDIT_CARD", "WALLET"])),
            "beckn:offerAttributes": pick("/beckn:offerAttributes", json!({
                "@context": OFFER_CONTEXT,
                "@type": "ChargingOffer",
                "buyerFinderFee": { "feeType": "PERCENTAGE", "feeValue": 2.5 },
                "idleFeePolicy": "₹2/min after 10 min post-charge"
            })),
        });
        merge(&mut offer, &merged);

        // Order value is always computed here, never read from the request
        let quantity = number_at(line, "/beckn:quantity/unitQuantity").unwrap_or(DEFAULT_QUANTITY_KWH);
        let unit_price = number_at(Some(&offer), "/beckn:price/value").unwrap_or(DEFAULT_UNIT_PRICE);
        let currency = at(Some(&offer), "/beckn:price/currency")
            .or_else(|| at(line, "/beckn:price/currency"))
            .and_then(Value::as_str)
            .unwrap_or("INR")
            .to_string();
        let quote = quote(quantity, unit_price, &currency);
        debug!(quantity, unit_price, total = quote.total, "EV charging quote computed");

        let seller = first_or(
            &[at(item, "/beckn:provider/beckn:id"), at(request, "/beckn:seller"), at(Some(&offer), "/beckn:provider")],
            json!(SELLER),
        );
        let applicable_quantity = first_or(
            &[at(Some(&offer), "/beckn:price/applicableQuantity")],
            json!({ "unitText": "Kilowatt Hour", "unitCode": "KWH", "unitQuantity": quantity }),
        );
        let payment_methods = first_or(
            &[at(Some(&offer), "/beckn:acceptedPaymentMethod")],
            json!(["BANK_TRANSFER", "UPI", "WALLET"]),
        );
        let reservation = format!("RESV-{}", millis_suffix(6));
        let delivery = at(request, "/beckn:fulfillment/beckn:deliveryAttributes");
        json!({
            "@context": CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(request, "/beckn:id")], json!(format!("order-ev-charging-{}", now_millis()))),
            "beckn:orderStatus": "PENDING",
            "beckn:seller": seller,
            "beckn:buyer": first_present(&[at(request, "/beckn:buyer")]),
            "beckn:orderItems": [{
                "beckn:lineId": first_or(&[at(line, "/beckn:lineId")], json!("line-001")),
                "beckn:orderedItem": ordered_item,
                "beckn:quantity": first_or(&[at(line, "/beckn:quantity")], json!({
                    "unitText": "Kilowatt Hour",
                    "unitCode": "KWH",
                    "unitQuantity": DEFAULT_QUANTITY_KWH
                })),
                "beckn:acceptedOffer": offer,
                "beckn:price": first_or(&[at(line, "/beckn:price")], json!({
                    "currency": currency,
                    "value": unit_price * quantity,
                    "applicableQuantity": applicable_quantity
                })),
            }],
            "beckn:orderValue": quote.to_plain_value(),
            "beckn:payment": {
                "@context": CORE_CONTEXT,
                "@type": "beckn:Payment",
                "beckn:id": format!("payment-{}", Uuid::new_v4()),
                "beckn:amount": { "currency": quote.currency, "value": quote.total },
                "beckn:paymentURL": PAYMENT_URL,
                "beckn:txnRef": format!("TXN-{}", now_millis()),
                "beckn:beneficiary": "BPP",
                "beckn:acceptedPaymentMethod": payment_methods,
                "beckn:paymentStatus": "PENDING"
            },
            "beckn:fulfillment": {
                "@context": CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-charging-{}", now_millis())),
                ),
                "beckn:mode": "RESERVATION",
                "beckn:deliveryAttributes": {
                    "@context": SESSION_CONTEXT,
                    "@type": "ChargingSession",
                    "sessionStatus": "PENDING",
                    "authorizationMode": "APP_QR",
                    "authorizationOtpHint": "Scan QR code at charging station",
                    "connectorType": first_or(
                        &[at(item, "/beckn:itemAttributes/connectorType"), at(delivery, "/connectorType")],
                        json!("CCS2"),
                    ),
                    "maxPowerKW": first_or(
                        &[at(item, "/beckn:itemAttributes/maxPowerKW"), at(delivery, "/maxPowerKW")],
                        json!(60),
                    ),
                    "reservationId": reservation,
                    "gracePeriodMinutes": 10,
                    "trackingId": format!("TRK-{}", millis_suffix(6)),
                    "trackingUrl": format!("https://cpo.example.org/session/{}", reservation),
                    "trackingStatus": "ACTIVE"
                }
            }
        })
    }

    fn on_init(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let selected = input.prior_order();
        let session = at(selected, "/beckn:fulfillment/beckn:deliveryAttributes");
        let vehicle = at(request, "/beckn:fulfillment/beckn:deliveryAttributes");

        let mut attributes = first_or(
            &[at(request, "/beckn:orderAttributes"), at(selected, "/beckn:orderAttributes")],
            default_session_preferences(),
        );
        if let Some(fields) = attributes.as_object_mut() {
            fields.insert("sessionStatus".to_string(), json!("PENDING"));
        }

        json!({
            "@context": CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(selected, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-{}", now_millis()))),
            "beckn:orderStatus": "PENDING",
            "beckn:orderNumber": format!("ORD-{}", now_millis()),
            "beckn:seller": first_or(&[at(selected, "/beckn:seller"), at(request, "/beckn:seller")], json!(SELLER)),
            "beckn:buyer": first_present(&[at(request, "/beckn:buyer"), at(selected, "/beckn:buyer")]),
            "beckn:orderItems": carried_items(request, selected),
            "beckn:orderValue": carried_order_value(selected),
            "beckn:fulfillment": {
                "@context": CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id"), at(selected, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-{}", now_millis())),
                ),
                "beckn:mode": "RESERVATION",
                "beckn:deliveryAttributes": compact(json!({
                    "@context": SESSION_CONTEXT,
                    "@type": "ChargingSession",
                    "connectorType": first_or(&[at(session, "/connectorType")], json!("CCS2")),
                    "maxPowerKW": first_or(&[at(session, "/maxPowerKW")], json!(50)),
                    "authorizationMode": "OTP",
                    "vehicleMake": first_present(&[at(vehicle, "/vehicleMake")]),
                    "vehicleModel": first_present(&[at(vehicle, "/vehicleModel")]),
                    "sessionStatus": "PENDING"
                }))
            },
            "beckn:payment": {
                "@context": CORE_CONTEXT,
                "@type": "beckn:Payment",
                "beckn:id": first_or(&[at(request, "/beckn:payment/beckn:id")], json!(format!("payment-{}", now_millis()))),
                "beckn:amount": first_or(
                    &[at(request, "/beckn:payment/beckn:amount"), at(selected, "/beckn:payment/beckn:amount")],
                    json!({ "currency": "INR", "value": DEFAULT_TOTAL }),
                ),
                "beckn:paymentURL": first_or(
                    &[at(request, "/beckn:payment/beckn:paymentURL"), at(selected, "/beckn:payment/beckn:paymentURL")],
                    json!(PAYMENT_URL),
                ),
                "beckn:txnRef": format!("TXN-{}", now_millis()),
                "beckn:beneficiary": "BPP",
                "beckn:acceptedPaymentMethod": first_or(
                    &[at(request, "/beckn:payment/beckn:acceptedPaymentMethod")],
                    json!(["BANK_TRANSFER", "UPI", "WALLET"]),
                ),
                "beckn:paymentStatus": "INITIATED"
            },
            "beckn:orderAttributes": attributes
        })
    }

    fn on_confirm(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let initialized = input.prior_order();
        let session = at(initialized, "/beckn:fulfillment/beckn:deliveryAttributes");
        let vehicle = at(request, "/beckn:fulfillment/beckn:deliveryAttributes");

        let mut default_attributes = default_session_preferences();
        if let Some(fields) = default_attributes.as_object_mut() {
            fields.insert("authorizationMode".to_string(), json!("OTP"));
            fields.insert("authorizationOtpHint".to_string(), json!(OTP_HINT));
            fields.insert("sessionStatus".to_string(), json!("PENDING"));
        }

        json!({
            "@context": CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(initialized, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-{}", now_millis()))),
            "beckn:orderStatus": "CONFIRMED",
            "beckn:orderNumber": first_or(
                &[at(initialized, "/beckn:orderNumber"), at(request, "/beckn:orderNumber")],
                json!(format!("ORD-{}", now_millis())),
            ),
            "beckn:seller": first_or(&[at(initialized, "/beckn:seller"), at(request, "/beckn:seller")], json!(SELLER)),
            "beckn:buyer": first_or(&[at(request, "/beckn:buyer"), at(initialized, "/beckn:buyer")], json!({
                "@context": CORE_CONTEXT,
                "@type": "beckn:Buyer",
                "beckn:id": format!("buyer-{}", now_millis()),
                "beckn:role": "BUYER"
            })),
            "beckn:orderItems": carried_items(request, initialized),
            "beckn:orderValue": carried_order_value(initialized),
            "beckn:fulfillment": {
                "@context": CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id"), at(initialized, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-{}", now_millis())),
                ),
                "beckn:mode": "RESERVATION",
                "beckn:deliveryAttributes": compact(json!({
                    "@context": SESSION_CONTEXT,
                    "@type": "ChargingSession",
                    "connectorType": first_or(&[at(session, "/connectorType")], json!("CCS2")),
                    "maxPowerKW": first_or(&[at(session, "/maxPowerKW")], json!(50)),
                    "vehicleMake": first_present(&[at(vehicle, "/vehicleMake"), at(session, "/vehicleMake")]),
                    "vehicleModel": first_present(&[at(vehicle, "/vehicleModel"), at(session, "/vehicleModel")]),
                    "sessionStatus": "PENDING"
                }))
            },
            "beckn:payment": {
                "@context": CORE_CONTEXT,
                "@type": "beckn:Payment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:payment/beckn:id"), at(initialized, "/beckn:payment/beckn:id")],
                    json!(format!("payment-{}", now_millis())),
                ),
                "beckn:amount": first_or(
                    &[at(request, "/beckn:payment/beckn:amount"), at(initialized, "/beckn:payment/beckn:amount")],
                    json!({ "currency": "INR", "value": DEFAULT_TOTAL }),
                ),
                "beckn:paymentURL": first_or(
                    &[at(request, "/beckn:payment/beckn:paymentURL"), at(initialized, "/beckn:payment/beckn:paymentURL")],
                    json!(PAYMENT_URL),
                ),
                "beckn:txnRef": format!("TXN-{}", now_millis()),
                "beckn:paidAt": timestamp(),
                "beckn:beneficiary": "BPP",
                "beckn:acceptedPaymentMethod": first_or(
                    &[
                        at(request, "/beckn:payment/beckn:acceptedPaymentMethod"),
                        at(initialized, "/beckn:payment/beckn:acceptedPaymentMethod"),
                    ],
                    json!(["BANK_TRANSFER", "UPI", "WALLET"]),
                ),
                "beckn:paymentStatus": "COMPLETED"
            },
            "beckn:orderAttributes": first_or(
                &[at(request, "/beckn:orderAttributes"), at(initialized, "/beckn:orderAttributes")],
                default_attributes,
            )
        })
    }

    /// Body shared by status, update and cancel: the confirmed order with a
    /// new order status and session status
    fn confirmed_order(&self, confirmed: Option<&Value>, order_status: &str, session_status: Option<&str>) -> Value {
        let session = at(confirmed, "/beckn:fulfillment/beckn:deliveryAttributes");
        let mut delivery = compact(json!({
            "@context": SESSION_CONTEXT,
            "@type": "ChargingSession",
            "connectorType": first_or(&[at(session, "/connectorType")], json!("CCS2")),
            "maxPowerKW": first_or(&[at(session, "/maxPowerKW")], json!(50)),
            "authorizationMode": first_or(&[at(session, "/authorizationMode")], json!("OTP")),
            "authorizationOtpHint": first_or(&[at(session, "/authorizationOtpHint")], json!(OTP_HINT)),
            "vehicleMake": first_present(&[at(session, "/vehicleMake")]),
            "vehicleModel": first_present(&[at(session, "/vehicleModel")]),
        }));
        if let (Some(fields), Some(status)) = (delivery.as_object_mut(), session_status) {
            fields.insert("sessionStatus".to_string(), json!(status));
        }

        compact(json!({
            "@context": CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(confirmed, "/beckn:id")], json!(format!("order-bpp-{}", now_millis()))),
            "beckn:orderStatus": order_status,
            "beckn:orderNumber": first_or(&[at(confirmed, "/beckn:orderNumber")], json!(fallback_order_number())),
            "beckn:seller": first_or(&[at(confirmed, "/beckn:seller")], json!(SELLER)),
            "beckn:buyer": first_present(&[at(confirmed, "/beckn:buyer")]),
            "beckn:orderItems": carried_items(None, confirmed),
            "beckn:orderValue": carried_order_value(confirmed),
            "beckn:fulfillment": {
                "@context": CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(&[at(confirmed, "/beckn:fulfillment/beckn:id")], json!("fulfillment-001")),
                "beckn:mode": "RESERVATION",
                "beckn:deliveryAttributes": delivery
            },
            "beckn:payment": settled_payment(confirmed)
        }))
    }

    fn on_status(&self, input: &GeneratorInput<'_>) -> Value {
        let mut order = self.confirmed_order(input.prior_order(), "INPROGRESS", Some("INTERRUPTED"));
        if let Some(fulfillment) = order.get_mut("beckn:fulfillment").and_then(Value::as_object_mut) {
            fulfillment.insert("trackingAction".to_string(), tracking_action());
        }
        order
    }

    fn on_update(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let session_end = at(request, "/beckn:fulfillment/beckn:deliveryAttributes/sessionStatus")
            == Some(&json!("COMPLETED"))
            || at(request, "/beckn:orderStatus") == Some(&json!("COMPLETED"));
        let (order_status, session_status) = if session_end {
            ("COMPLETED", "COMPLETED")
        } else {
            ("INPROGRESS", "ACTIVE")
        };

        let confirmed = input.prior_order();
        let mut order = self.confirmed_order(confirmed, order_status, Some(session_status));
        if let Some(fields) = order.as_object_mut() {
            fields.insert(
                "beckn:seller".to_string(),
                first_or(&[at(confirmed, "/beckn:seller"), at(request, "/beckn:seller")], json!(SELLER)),
            );
            fields.insert("beckn:orderItems".to_string(), carried_items(request, confirmed));
            if let Some(buyer) = at(request, "/beckn:buyer") {
                fields.insert("beckn:buyer".to_string(), buyer.clone());
            }
        }
        let vehicle = at(request, "/beckn:fulfillment/beckn:deliveryAttributes");
        if let Some(fulfillment) = order.get_mut("beckn:fulfillment").and_then(Value::as_object_mut) {
            if session_end {
                fulfillment.insert("trackingAction".to_string(), tracking_action());
            }
            if let Some(delivery) = fulfillment.get_mut("beckn:deliveryAttributes").and_then(Value::as_object_mut) {
                for key in ["vehicleMake", "vehicleModel"] {
                    if let Some(value) = vehicle.and_then(|v| v.get(key)).filter(|v| !v.is_null()) {
                        delivery.insert(key.to_string(), value.clone());
                    }
                }
            }
        }
        order
    }

    fn on_cancel(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let confirmed = input.prior_order();
        let mut order = self.confirmed_order(confirmed, "CANCELLED", None);
        if let Some(fields) = order.as_object_mut() {
            let items = first_or(
                &[
                    at(request, "/beckn:orderItems/0/beckn:orderItems"),
                    at(request, "/beckn:orderItems"),
                    at(confirmed, "/beckn:orderItems"),
                ],
                json!([]),
            );
            fields.insert("beckn:orderItems".to_string(), items);
            if let Some(buyer) = at(request, "/beckn:buyer/0").or_else(|| at(request, "/beckn:buyer")) {
                fields.insert("beckn:buyer".to_string(), buyer.clone());
            }
        }
        order
    }

    fn on_track(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let confirmed = input.prior_order();
        let items: Vec<Value> = carried_items(request, confirmed)
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        json!({
                            "beckn:lineId": item.get("beckn:lineId"),
                            "beckn:orderedItem": item.get("beckn:orderedItem"),
                            "beckn:quantity": item.get("beckn:quantity"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        compact(json!({
            "@context": CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(confirmed, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-bpp-{}", now_millis()))),
            "beckn:orderStatus": "INPROGRESS",
            "beckn:seller": first_or(&[at(confirmed, "/beckn:seller"), at(request, "/beckn:seller")], json!(SELLER)),
            "beckn:buyer": first_present(&[at(request, "/beckn:buyer"), at(confirmed, "/beckn:buyer")]),
            "beckn:orderItems": items,
            "beckn:fulfillment": {
                "@context": CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(&[at(confirmed, "/beckn:fulfillment/beckn:id")], json!("fulfillment-001")),
                "beckn:mode": "RESERVATION",
                "trackingAction": tracking_action(),
                "beckn:deliveryAttributes": {
                    "@context": SESSION_CONTEXT,
                    "@type": "ChargingSession",
                    "chargingTelemetry": [
                        telemetry(0, [62.5, 18.4, 10.2, 392.0, 47.0]),
                        telemetry(5, [65.0, 17.1, 11.1, 388.0, 44.2]),
                    ]
                }
            }
        }))
    }

    fn on_rating(&self) -> Value {
        json!({
            "received": true,
            "feedbackForm": {
                "url": "https://example-bpp.com/feedback/portal",
                "mime_type": "application/xml",
                "submission_id": format!("feedback-{}", now_millis())
            }
        })
    }

    fn on_support(&self) -> Value {
        json!({
            "support": {
                "name": "BlueCharge Support Team",
                "phone": "18001080",
                "email": "support@bluechargenet-aggregator.io",
                "url": format!("https://support.bluechargenet-aggregator.io/ticket/SUP-{}", now_millis()),
                "hours": "Mon–Sun 24/7 IST",
                "channels": ["PHONE", "EMAIL", "WEB", "CHAT"]
            }
        })
    }
}

impl ResponseGenerator for EvChargingGenerator {
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
            ResponseAction::OnRating => self.on_rating(),
            ResponseAction::OnSupport => self.on_support(),
            ResponseAction::OnDiscover => return Err(GeneratorError::Unsupported(action)),
        };
        Ok(body)
    }
}

/// Domain configuration for registration
pub fn config() -> DomainConfig {
    DomainConfig::new(DOMAIN, Arc::new(EvChargingGenerator::new())).with_patterns(MATCH_PATTERNS)
}

fn carried_order_value(prior: Option<&Value>) -> Value {
    first_or(
        &[at(prior, "/beckn:orderValue")],
        json!({
            "@context": CORE_CONTEXT,
            "@type": "schema:PriceSpecification",
            "schema:priceCurrency": "INR",
            "schema:price": DEFAULT_TOTAL,
            "beckn:components": []
        }),
    )
}

fn settled_payment(confirmed: Option<&Value>) -> Value {
    json!({
        "@context": CORE_CONTEXT,
        "@type": "beckn:Payment",
        "beckn:id": first_or(&[at(confirmed, "/beckn:payment/beckn:id")], json!(format!("payment-{}", Uuid::new_v4()))),
        "beckn:amount": {
            "currency": first_or(&[at(confirmed, "/beckn:orderValue/currency")], json!("INR")),
            "value": first_or(&[at(confirmed, "/beckn:orderValue/value")], json!(DEFAULT_TOTAL))
        },
        "beckn:paymentURL": first_or(&[at(confirmed, "/beckn:payment/beckn:paymentURL")], json!(PAYMENT_URL)),
        "beckn:txnRef": first_or(&[at(confirmed, "/beckn:payment/beckn:txnRef")], json!(format!("TXN-{}", now_millis()))),
        "beckn:paidAt": first_or(&[at(confirmed, "/beckn:payment/beckn:paidAt")], json!(timestamp())),
        "beckn:beneficiary": "BPP",
        "beckn:acceptedPaymentMethod": first_or(
            &[at(confirmed, "/beckn:payment/beckn:acceptedPaymentMethod")],
            json!(["BANK_TRANSFER", "UPI", "WALLET"]),
        ),
        "beckn:paymentStatus": "COMPLETED"
    })
}

fn default_session_preferences() -> Value {
    json!({
        "@context": SESSION_CONTEXT,
        "@type": "ChargingSession",
        "sessionPreferences": {
            "preferredStartTime": timestamp(),
            "preferredEndTime": timestamp_in(Duration::hours(2)),
            "notificationPreferences": { "email": true, "sms": true, "push": false }
        }
    })
}

fn tracking_action() -> Value {
    let session = millis_suffix(10);
    json!({
        "@type": "schema:TrackAction",
        "target": {
            "@type": "schema:EntryPoint",
            "url": format!("{}/SESSION-{}", TRACKING_BASE, session)
        },
        "deliveryMethod": "RESERVATION",
        "reservationId": format!("TRACK-SESSION-{}", session)
    })
}

fn telemetry(offset_minutes: i64, [soc, power, energy, voltage, current]: [f64; 5]) -> Value {
    json!({
        "eventTime": timestamp_in(Duration::minutes(offset_minutes)),
        "metrics": [
            { "name": "STATE_OF_CHARGE", "value": soc, "unitCode": "PERCENTAGE" },
            { "name": "POWER", "value": power, "unitCode": "KWH" },
            { "name": "ENERGY", "value": energy, "unitCode": "KW" },
            { "name": "VOLTAGE", "value": voltage, "unitCode": "VLT" },
            { "name": "CURRENT", "value": current, "unitCode": "AMP" }
        ]
    })
}

fn fallback_order_number() -> String {
    format!("ORD-{}-{:03}", chrono::Utc::now().format("%Y"), rand::random::<u16>() % 1000)
}
