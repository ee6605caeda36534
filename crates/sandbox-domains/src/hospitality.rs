//! Hospitality domain
//!
//! Hotel stays priced per night. Select quotes room charges, a fixed service
//! charge and VAT; init re-prices with any add-ons the guest picked. There is
//! no tracking for a stay.

use rand::Rng;
use sandbox_core::{ContextRecord, DomainConfig, GeneratorError, GeneratorInput, ResponseAction, ResponseGenerator};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::order::{
    at, compact, find_by_id, find_offer_for_item, first_or, first_present, merge, millis_suffix, now_millis,
    number_at, order_currency, order_total, round2, str_at, timestamp, timestamp_in, PriceLine, Quote,
    DRAFT_CORE_CONTEXT,
};

/// Canonical domain identifier
pub const DOMAIN: &str = "beckn.one:commerce:hospitality:1.0";

/// Strings that resolve to this domain
pub const MATCH_PATTERNS: [&str; 6] = [
    "hospitality",
    "hotel",
    "commerce:hospitality",
    "beckn.one:commerce:hospitality",
    "beckn.one:commerce:hospitality:1.0",
    "accommodation",
];

const SELLER_ID: &str = "provider-grand-siam-hotel";
const HOTEL_SERVICE_CONTEXT: &str =
    "https://raw.githubusercontent.com/beckn/protocol-specifications-new/refs/heads/draft/schema/HotelService/v1/context.jsonld";
const HOTEL_BOOKING_CONTEXT: &str =
    "https://raw.githubusercontent.com/beckn/protocol-specifications-new/refs/heads/draft/schema/HotelBooking/v1/context.jsonld";
const DOCUMENTS_URL: &str = "https://hotel-aggregator-platform.com/documents";

const DEFAULT_NIGHTS: f64 = 5.0;
const DEFAULT_NIGHTLY_RATE: f64 = 120.0;
const DEFAULT_TOTAL: f64 = 752.25;
const SERVICE_CHARGE: f64 = 30.0;
const VAT_PERCENT: f64 = 7.0;
const CANCELLATION_FEE: f64 = 60.0;

/// Stay quote: room charges, add-ons, service charge, then VAT on all of it
pub fn quote(nights: f64, nightly_rate: f64, add_ons: Option<(&str, f64)>, currency: &str) -> Quote {
    let room_charges = nightly_rate * nights;
    let mut lines = vec![PriceLine::new(
        "UNIT",
        room_charges,
        format!("Room charges ({} nights × ${})", nights, round2(nightly_rate)),
    )];
    let mut taxable = room_charges + SERVICE_CHARGE;
    if let Some((names, total)) = add_ons.filter(|(_, total)| *total > 0.0) {
        taxable += total;
        let description = if names.is_empty() {
            "Add-ons".to_string()
        } else {
            format!("Add-ons ({})", names)
        };
        lines.push(PriceLine::new("UNIT", total, description));
    }
    lines.push(PriceLine::new("FEE", SERVICE_CHARGE, "Service charge"));
    lines.push(PriceLine::new(
        "TAX",
        taxable * VAT_PERCENT / 100.0,
        format!("VAT ({}%)", VAT_PERCENT),
    ));
    Quote::from_lines(currency, lines)
}

/// Response generators for hotel stays
#[derive(Debug, Clone, Default)]
pub struct HospitalityGenerator;

impl HospitalityGenerator {
    /// Create the generator set
    pub fn new() -> Self {
        Self
    }

    fn on_select(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let catalog = input.prior.and_then(ContextRecord::first_catalog);
        let line = at(request, "/beckn:orderItems/0");
        let item_id = at(line, "/beckn:orderedItem");
        let item = find_by_id(at(catalog, "/beckn:items"), item_id);
        let offer = find_offer_for_item(at(catalog, "/beckn:offers"), item_id);

        let nights = nights(line);
        let rate = number_at(offer, "/beckn:price/schema:price")
            .or_else(|| number_at(item, "/beckn:price/schema:price"))
            .unwrap_or(DEFAULT_NIGHTLY_RATE);
        let currency = str_at(offer, "/beckn:price/schema:priceCurrency")
            .or_else(|| str_at(item, "/beckn:price/schema:priceCurrency"))
            .unwrap_or("USD");
        let quote = quote(nights, rate, None, currency);
        debug!(nights, rate, total = quote.total, "Hotel stay quoted");

        let descriptor = match at(offer, "/beckn:descriptor") {
            Some(found) => {
                let mut descriptor = json!({ "@context": DRAFT_CORE_CONTEXT, "@type": "beckn:Descriptor" });
                merge(&mut descriptor, found);
                descriptor
            }
            None => json!({
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Descriptor",
                "schema:name": format!("Deluxe Room with Breakfast - {} Nights", nights),
                "beckn:shortDesc": "Standard rate for 5 nights stay"
            }),
        };

        let mut attributes = first_or(&[at(item, "/beckn:itemAttributes")], json!({}));
        if let Some(fields) = attributes.as_object_mut() {
            for key in ["hotel:cancellationPolicy", "hotel:hotelChain", "hotel:starRating"] {
                fields.remove(key);
            }
        }
        let mut room = room_attributes();
        if let (Some(room), Some(fields)) = (room.as_object_mut(), attributes.as_object()) {
            for (key, value) in fields.iter().filter(|(key, value)| key.starts_with("hotel:") && !value.is_null()) {
                room.insert(key.clone(), value.clone());
            }
        }
        let requested_time = at(request, "/beckn:fulfillment/beckn:time");

        json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(request, "/beckn:id")], json!(format!("order-hotel-{}", now_millis()))),
            "beckn:orderStatus": "QUOTE_REQUESTED",
            "beckn:seller": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Provider",
                "beckn:id": first_or(&[at(item, "/beckn:provider/beckn:id"), at(request, "/beckn:seller")], json!(SELLER_ID)),
                "beckn:descriptor": first_or(&[at(item, "/beckn:provider/beckn:descriptor")], json!({
                    "@type": "beckn:Descriptor",
                    "schema:name": "Grand Siam Hotel",
                    "beckn:shortDesc": "Luxury hotel in the heart of Bangkok"
                }))
            },
            "beckn:orderItems": [{
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:OrderItem",
                "beckn:lineId": first_or(&[at(line, "/beckn:lineId")], json!("line-001")),
                "beckn:orderedItem": first_or(&[item_id, at(item, "/beckn:id")], json!("item-hotel-grand-siam-deluxe")),
                "beckn:acceptedOffer": {
                    "@context": DRAFT_CORE_CONTEXT,
                    "@type": "beckn:Offer",
                    "beckn:id": first_or(
                        &[at(offer, "/beckn:id")],
                        json!(format!("offer-{}-base", item_id.and_then(Value::as_str).unwrap_or("hotel"))),
                    ),
                    "beckn:descriptor": descriptor,
                    "beckn:price": nightly_price(currency, rate),
                    "beckn:addOnItems": first_or(&[at(offer, "/beckn:addOnItems")], default_add_ons(currency))
                },
                "beckn:quantity": first_or(&[at(line, "/beckn:quantity")], nights_quantity(nights)),
                "beckn:price": first_or(&[at(line, "/beckn:price")], nightly_price(currency, rate)),
                "beckn:orderItemAttributes": room
            }],
            "beckn:orderValue": quote.to_price_specification(),
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-hotel-{}", now_millis())),
                ),
                "beckn:type": "hotel_stay",
                "beckn:time": stay_period(requested_time, None, nights)
            }
        })
    }

    fn on_init(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let quoted = input.prior_order();
        let quoted_value = at(quoted, "/beckn:orderValue");
        let quoted_line = at(quoted, "/beckn:orderItems/0");
        let nights = nights(quoted_line);
        let currency = str_at(quoted_value, "/schema:priceCurrency").unwrap_or("USD");

        let room_charges = number_at(quoted_value, "/beckn:components/0/beckn:value").unwrap_or_else(|| {
            number_at(quoted_value, "/schema:price").unwrap_or(672.0)
                - number_at(quoted_value, "/beckn:components/1/beckn:value").unwrap_or(SERVICE_CHARGE)
                - number_at(quoted_value, "/beckn:components/2/beckn:value").unwrap_or(42.0)
        });
        let rate = room_charges / nights;

        let catalog_add_ons = at(quoted_line, "/beckn:acceptedOffer/beckn:addOnItems");
        let chosen = at(request, "/beckn:orderItems/0/beckn:acceptedOffer/beckn:addOnItems")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let add_ons: Vec<Value> = chosen
            .iter()
            .map(|choice| find_add_on(catalog_add_ons, add_on_id(choice)).cloned().unwrap_or_else(|| choice.clone()))
            .collect();
        let add_ons_total: f64 = add_ons.iter().map(add_on_price).sum();
        let add_on_names = add_ons
            .iter()
            .filter_map(|add_on| add_on.get("schema:name").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" + ");
        let quote = quote(nights, rate, Some((add_on_names.as_str(), add_ons_total)), currency);

        let items: Vec<Value> = order_lines(quoted, request)
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let requested = at(request, &format!("/beckn:orderItems/{}", index));
                let chosen_ids: Vec<&str> = at(requested, "/beckn:acceptedOffer/beckn:addOnItems")
                    .and_then(Value::as_array)
                    .map(|ids| ids.iter().filter_map(add_on_id).collect())
                    .unwrap_or_default();
                let kept: Vec<Value> = at(Some(item), "/beckn:acceptedOffer/beckn:addOnItems")
                    .and_then(Value::as_array)
                    .map(|all| {
                        all.iter()
                            .filter(|add_on| add_on_id(add_on).map(|id| chosen_ids.contains(&id)).unwrap_or(false))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                let mut item = carried_item(Some(item), requested, currency, rate);
                if let Some(offer) = item.get_mut("beckn:acceptedOffer") {
                    merge(offer, &json!({ "beckn:addOnItems": kept }));
                }
                item
            })
            .collect();

        let order_value = {
            let mut value = quote.to_price_specification();
            if let Some(context) = at(quoted_value, "/@context") {
                merge(&mut value, &json!({ "@context": context }));
            }
            value
        };
        let amount = quote.total;

        compact(json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(quoted, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-hotel-{}", now_millis()))),
            "beckn:orderStatus": "INITIALIZED",
            "beckn:seller": first_or(&[at(quoted, "/beckn:seller"), at(request, "/beckn:seller")], json!({
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Provider",
                "beckn:id": SELLER_ID
            })),
            "beckn:buyer": first_present(&[at(request, "/beckn:buyer"), at(quoted, "/beckn:buyer")]),
            "beckn:orderItems": items,
            "beckn:orderValue": order_value,
            "beckn:payment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Payment",
                "beckn:type": "PRE_FULFILLMENT",
                "beckn:status": "NOT_PAID",
                "beckn:amount": { "@type": "schema:PriceSpecification", "schema:priceCurrency": currency, "schema:price": amount },
                "beckn:params": { "currency": currency, "amount": amount.to_string() }
            },
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id"), at(quoted, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-hotel-{}", now_millis())),
                ),
                "beckn:type": "hotel_stay",
                "beckn:time": stay_period(
                    at(request, "/beckn:fulfillment/beckn:time"),
                    at(quoted, "/beckn:fulfillment/beckn:time"),
                    nights,
                )
            },
            "beckn:orderAttributes": first_or(
                &[at(request, "/beckn:orderAttributes"), at(quoted, "/beckn:orderAttributes")],
                json!({ "@context": HOTEL_BOOKING_CONTEXT, "@type": "beckn:HotelBooking", "guests": [] }),
            )
        }))
    }

    fn on_confirm(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let initialized = input.prior_order();
        let currency = order_currency(initialized).unwrap_or("USD");
        let total = order_total(initialized).unwrap_or(DEFAULT_TOTAL);
        let first_rate = number_at(initialized, "/beckn:orderValue/beckn:components/0/beckn:value");

        let booking_id = format!("HBNK{}", millis_suffix(4));
        let booking_reference = format!("GS-{}-{}", chrono::Utc::now().format("%Y%m%d"), booking_id);

        let items: Vec<Value> = order_lines(initialized, request)
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let requested = at(request, &format!("/beckn:orderItems/{}", index));
                let nights = nights(Some(item));
                let rate = first_rate.map(|value| value / nights).unwrap_or(DEFAULT_NIGHTLY_RATE);
                let all = at(Some(item), "/beckn:acceptedOffer/beckn:addOnItems");
                let expanded = match at(requested, "/beckn:acceptedOffer/beckn:addOnItems")
                    .and_then(Value::as_array)
                    .filter(|ids| !ids.is_empty())
                {
                    Some(ids) => Value::Array(
                        ids.iter()
                            .map(|choice| {
                                let id = add_on_id(choice);
                                find_add_on(all, id)
                                    .cloned()
                                    .unwrap_or_else(|| json!({ "@type": "schema:Offer", "@id": id }))
                            })
                            .collect(),
                    ),
                    None => first_or(&[all], json!([])),
                };
                let mut item = carried_item(Some(item), requested, currency, rate);
                if let Some(offer) = item.get_mut("beckn:acceptedOffer") {
                    merge(offer, &json!({ "beckn:addOnItems": expanded }));
                }
                item
            })
            .collect();

        let guests: Vec<Value> = guests(&[at(request, "/beckn:orderAttributes/guests"), at(initialized, "/beckn:orderAttributes/guests")])
            .into_iter()
            .map(|mut guest| {
                if at(Some(&guest), "/roomNumber").is_none() {
                    merge(&mut guest, &json!({ "roomNumber": "TBA" }));
                }
                guest
            })
            .collect();
        let nights = nights(at(initialized, "/beckn:orderItems/0"));

        compact(json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(initialized, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-hotel-{}", now_millis()))),
            "beckn:orderStatus": "CONFIRMED",
            "beckn:seller": seller_with_contact(at(initialized, "/beckn:seller").or_else(|| at(request, "/beckn:seller"))),
            "beckn:buyer": first_present(&[at(request, "/beckn:buyer"), at(initialized, "/beckn:buyer")]),
            "beckn:orderItems": items,
            "beckn:orderValue": carried_order_value(initialized),
            "beckn:payment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Payment",
                "beckn:type": "PRE_FULFILLMENT",
                "beckn:status": "PAID",
                "beckn:amount": first_or(
                    &[at(request, "/beckn:payment/beckn:amount"), at(initialized, "/beckn:payment/beckn:amount")],
                    json!({ "@type": "schema:PriceSpecification", "schema:priceCurrency": "USD", "schema:price": DEFAULT_TOTAL }),
                ),
                "beckn:params": {
                    "currency": currency,
                    "amount": total.to_string(),
                    "transaction_id": first_or(
                        &[at(request, "/beckn:payment/beckn:params/transaction_id")],
                        json!(format!("TXN-PAY-HOTEL-{}", now_millis())),
                    )
                }
            },
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id"), at(initialized, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-hotel-{}", now_millis())),
                ),
                "beckn:type": "hotel_stay",
                "beckn:state": "CONFIRMED",
                "beckn:time": stay_period(
                    at(request, "/beckn:fulfillment/beckn:time"),
                    at(initialized, "/beckn:fulfillment/beckn:time"),
                    nights,
                )
            },
            "beckn:orderAttributes": {
                "@context": HOTEL_BOOKING_CONTEXT,
                "@type": "beckn:HotelBooking",
                "bookingId": booking_id,
                "bookingReference": booking_reference,
                "guests": guests,
                "confirmationDocument": confirmation_document(&booking_id),
                "cancellationPolicy": first_or(
                    &[
                        at(initialized, "/beckn:orderAttributes/cancellationPolicy"),
                        at(request, "/beckn:orderAttributes/cancellationPolicy"),
                    ],
                    json!({
                        "freeCancellationUntil": timestamp_in(chrono::Duration::days(2)),
                        "cancellationFee": CANCELLATION_FEE,
                        "refundable": true
                    }),
                )
            }
        }))
    }

    fn on_status(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let confirmed = input.prior_order();
        let first_guest = at(confirmed, "/beckn:orderAttributes/guests/0");
        let booking_state = str_at(request, "/beckn:fulfillment/beckn:state")
            .or_else(|| str_at(confirmed, "/beckn:fulfillment/beckn:state"))
            .unwrap_or("CONFIRMED");

        let stay = match booking_state {
            "CHECKED_IN" | "IN_PROGRESS" => StayState {
                order_status: "IN_PROGRESS",
                fulfillment_state: "CHECKED_IN",
                room_number: assigned_room(first_guest),
                check_in: Some(first_or(&[at(first_guest, "/checkInTime")], json!(timestamp()))),
                check_out: None,
            },
            "COMPLETED" | "CHECKED_OUT" => StayState {
                order_status: "COMPLETED",
                fulfillment_state: "COMPLETED",
                room_number: assigned_room(first_guest),
                check_in: Some(first_or(
                    &[at(first_guest, "/checkInTime")],
                    json!(timestamp_in(chrono::Duration::days(-5))),
                )),
                check_out: Some(first_or(&[at(first_guest, "/checkOutTime")], json!(timestamp()))),
            },
            _ => StayState {
                order_status: "CONFIRMED",
                fulfillment_state: "CONFIRMED",
                room_number: json!("TBA"),
                check_in: None,
                check_out: None,
            },
        };

        let guests: Vec<Value> = guests(&[at(confirmed, "/beckn:orderAttributes/guests")])
            .iter()
            .map(|guest| stay.guest(guest))
            .collect();
        let booking_id = booking_id(confirmed);
        let mut attributes = booking_attributes(confirmed, &booking_id);
        merge(&mut attributes, &json!({ "guests": guests }));
        if stay.order_status == "COMPLETED" {
            merge(
                &mut attributes,
                &json!({
                    "invoice": {
                        "url": format!("{}/invoice-{}.pdf", DOCUMENTS_URL, booking_id.to_lowercase()),
                        "mimeType": "application/pdf",
                        "totalAmount": order_total(confirmed).unwrap_or(DEFAULT_TOTAL)
                    }
                }),
            );
        }

        compact(json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(confirmed, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-hotel-{}", now_millis()))),
            "beckn:orderStatus": stay.order_status,
            "beckn:seller": seller_with_contact(at(confirmed, "/beckn:seller")),
            "beckn:buyer": first_present(&[at(confirmed, "/beckn:buyer")]),
            "beckn:orderItems": carried_items(confirmed),
            "beckn:orderValue": carried_order_value(confirmed),
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(&[at(confirmed, "/beckn:fulfillment/beckn:id")], json!(format!("fulfillment-hotel-{}", now_millis()))),
                "beckn:type": "hotel_stay",
                "beckn:state": stay.fulfillment_state,
                "beckn:time": first_or(&[at(confirmed, "/beckn:fulfillment/beckn:time")], stay_period(None, None, DEFAULT_NIGHTS))
            },
            "beckn:payment": first_or(&[at(confirmed, "/beckn:payment")], paid_payment()),
            "beckn:orderAttributes": attributes
        }))
    }

    fn on_update(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let confirmed = input.prior_order();
        let updates = guests(&[at(request, "/beckn:orderAttributes/guests")]);
        let existing = guests(&[at(confirmed, "/beckn:orderAttributes/guests")]);

        let room_number = str_at(existing.first(), "/roomNumber")
            .filter(|room| *room != "TBA")
            .map(|room| json!(room))
            .unwrap_or_else(random_room);
        let check_in = first_or(&[at(existing.first(), "/checkInTime")], json!(timestamp()));
        let assigned = json!({ "roomNumber": room_number, "checkInTime": check_in });

        let base = if existing.is_empty() { updates.clone() } else { existing };
        let guests: Vec<Value> = base
            .into_iter()
            .map(|mut guest| {
                if let Some(update) = updates.iter().find(|update| same_guest(update, &guest)) {
                    merge(&mut guest, update);
                }
                if let Some(fields) = guest.as_object_mut() {
                    fields.remove("updateReason");
                }
                merge(&mut guest, &assigned);
                guest
            })
            .collect();

        let booking_id = booking_id(confirmed);
        let mut attributes = booking_attributes(confirmed, &booking_id);
        merge(&mut attributes, &json!({ "guests": guests }));

        compact(json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(confirmed, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-hotel-{}", now_millis()))),
            "beckn:orderStatus": "IN_PROGRESS",
            "beckn:seller": seller_with_contact(at(confirmed, "/beckn:seller")),
            "beckn:buyer": first_present(&[at(request, "/beckn:buyer"), at(confirmed, "/beckn:buyer")]),
            "beckn:orderItems": carried_items(confirmed),
            "beckn:orderValue": carried_order_value(confirmed),
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id"), at(confirmed, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-hotel-{}", now_millis())),
                ),
                "beckn:type": "hotel_stay",
                "beckn:state": "IN_PROGRESS",
                "beckn:time": first_or(&[at(confirmed, "/beckn:fulfillment/beckn:time")], stay_period(None, None, DEFAULT_NIGHTS))
            },
            "beckn:payment": first_or(&[at(confirmed, "/beckn:payment")], paid_payment()),
            "beckn:orderAttributes": attributes
        }))
    }

    fn on_cancel(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let confirmed = input.prior_order();
        let total = order_total(confirmed).unwrap_or(DEFAULT_TOTAL);
        let currency = order_currency(confirmed).unwrap_or("USD");
        let policy = at(confirmed, "/beckn:orderAttributes/cancellationPolicy");
        let fee = number_at(policy, "/cancellationFee").unwrap_or(CANCELLATION_FEE);
        let refundable = at(policy, "/refundable").and_then(Value::as_bool).unwrap_or(true);
        let remaining = round2(total - fee);
        let refund = if refundable { remaining } else { 0.0 };

        let mut components = first_or(&[at(confirmed, "/beckn:orderValue/beckn:components")], json!([]));
        if let Some(lines) = components.as_array_mut() {
            lines.push(json!({
                "@type": "beckn:PriceComponent",
                "beckn:type": "FEE",
                "beckn:value": round2(-fee),
                "beckn:currency": currency,
                "beckn:description": "Cancellation fee"
            }));
        }

        let seller = match at(confirmed, "/beckn:seller").or_else(|| at(request, "/beckn:seller")) {
            Some(seller) if seller.get("@type").is_some() => {
                let mut seller = seller.clone();
                if let Some(fields) = seller.as_object_mut() {
                    fields.remove("beckn:locations");
                }
                let descriptor = seller.get("beckn:descriptor").cloned();
                merge(
                    &mut seller,
                    &json!({
                        "beckn:descriptor": {
                            "@type": "beckn:Descriptor",
                            "schema:name": first_or(&[at(descriptor.as_ref(), "/schema:name")], json!("Grand Siam Hotel")),
                            "beckn:shortDesc": first_or(
                                &[at(descriptor.as_ref(), "/beckn:shortDesc")],
                                json!("Luxury hotel in the heart of Bangkok"),
                            )
                        }
                    }),
                );
                seller
            }
            other => {
                let mut seller = default_seller();
                if let Some(id) = other {
                    merge(&mut seller, &json!({ "beckn:id": id }));
                }
                seller
            }
        };

        let mut period = first_or(&[at(confirmed, "/beckn:fulfillment/beckn:time")], stay_period(None, None, DEFAULT_NIGHTS));
        if let Some(fields) = period.as_object_mut() {
            fields.remove("beckn:duration");
        }

        let items: Vec<Value> = order_lines(confirmed, request)
            .into_iter()
            .map(|item| {
                let mut item = carried_item(Some(item), None, currency, DEFAULT_NIGHTLY_RATE);
                let room = item.get("beckn:orderItemAttributes").cloned();
                merge(&mut item, &json!({ "beckn:orderItemAttributes": cancelled_room(room.as_ref()) }));
                item
            })
            .collect();
        let booking_id = booking_id(confirmed);
        debug!(booking_id = %booking_id, fee, refund, "Hotel booking cancelled");

        compact(json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(confirmed, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-hotel-{}", now_millis()))),
            "beckn:orderStatus": "CANCELLED",
            "beckn:seller": seller,
            "beckn:buyer": first_present(&[at(request, "/beckn:buyer"), at(confirmed, "/beckn:buyer")]),
            "beckn:orderItems": items,
            "beckn:orderValue": {
                "@context": first_or(&[at(confirmed, "/beckn:orderValue/@context")], json!(DRAFT_CORE_CONTEXT)),
                "@type": "schema:PriceSpecification",
                "schema:priceCurrency": currency,
                "schema:price": remaining,
                "beckn:components": components
            },
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id"), at(confirmed, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-hotel-{}", now_millis())),
                ),
                "beckn:type": "hotel_stay",
                "beckn:state": "CANCELLED",
                "beckn:time": period
            },
            "beckn:payment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Payment",
                "beckn:type": "PRE_FULFILLMENT",
                "beckn:status": "REFUNDED",
                "beckn:amount": { "@type": "schema:PriceSpecification", "schema:priceCurrency": currency, "schema:price": remaining },
                "beckn:params": {
                    "currency": currency,
                    "amount": remaining.to_string(),
                    "transaction_id": first_or(
                        &[at(confirmed, "/beckn:payment/beckn:params/transaction_id")],
                        json!(format!("TXN-PAY-HOTEL-{}", now_millis())),
                    ),
                    "refund_transaction_id": format!("TXN-REFUND-HOTEL-{}", now_millis())
                }
            },
            "beckn:orderAttributes": {
                "@context": HOTEL_BOOKING_CONTEXT,
                "@type": "beckn:HotelBooking",
                "bookingId": booking_id,
                "bookingReference": first_or(
                    &[at(confirmed, "/beckn:orderAttributes/bookingReference")],
                    json!("GS-20251210-HBNK1025"),
                ),
                "cancellationDate": timestamp(),
                "refundAmount": refund,
                "refundStatus": "PROCESSED"
            }
        }))
    }

    fn on_rating(&self) -> Value {
        json!({
            "received": true,
            "aggregate": { "count": 2848, "value": 4.5, "best": 5, "worst": 1 },
            "feedbackForm": {
                "id": format!("detailed-hotel-feedback-{}", now_millis()),
                "name": "Detailed Hotel Stay Feedback",
                "url": format!("https://feedback.grandsiamhotel.com/detailed/booking-{}", now_millis()),
                "mime_type": "text/html"
            }
        })
    }

    fn on_support(&self) -> Value {
        json!({
            "support": {
                "phone": "+66 2 123 4567",
                "email": "support@grandsiamhotel.com",
                "url": "https://grandsiamhotel.com/support"
            }
        })
    }
}

impl ResponseGenerator for HospitalityGenerator {
    fn supports(&self, action: ResponseAction) -> bool {
        !matches!(action, ResponseAction::OnDiscover | ResponseAction::OnTrack)
    }

    fn generate(&self, action: ResponseAction, input: &GeneratorInput<'_>) -> Result<Value, GeneratorError> {
        let body = match action {
            ResponseAction::OnSelect => self.on_select(input),
            ResponseAction::OnInit => self.on_init(input),
            ResponseAction::OnConfirm => self.on_confirm(input),
            ResponseAction::OnStatus => self.on_status(input),
            ResponseAction::OnUpdate => self.on_update(input),
            ResponseAction::OnCancel => self.on_cancel(input),
            ResponseAction::OnRating => self.on_rating(),
            ResponseAction::OnSupport => self.on_support(),
            ResponseAction::OnDiscover | ResponseAction::OnTrack => return Err(GeneratorError::Unsupported(action)),
        };
        Ok(body)
    }
}

/// Domain configuration for registration
pub fn config() -> DomainConfig {
    DomainConfig::new(DOMAIN, Arc::new(HospitalityGenerator::new())).with_patterns(MATCH_PATTERNS)
}

/// Booking state as seen by a status query
struct StayState {
    order_status: &'static str,
    fulfillment_state: &'static str,
    room_number: Value,
    check_in: Option<Value>,
    check_out: Option<Value>,
}

impl StayState {
    fn guest(&self, guest: &Value) -> Value {
        let mut view = compact(json!({
            "guestId": first_or(&[at(Some(guest), "/guestId")], json!("GUEST001")),
            "name": first_present(&[at(Some(guest), "/name")]),
            "email": first_present(&[at(Some(guest), "/email")]),
            "phone": first_present(&[at(Some(guest), "/phone")]),
            "specialRequests": first_present(&[at(Some(guest), "/specialRequests")]),
            "roomNumber": self.room_number,
        }));
        if let Some(check_in) = &self.check_in {
            merge(&mut view, &json!({ "checkInTime": check_in }));
        }
        if let Some(check_out) = &self.check_out {
            merge(&mut view, &json!({ "checkOutTime": check_out }));
        }
        match self.fulfillment_state {
            "CHECKED_IN" => merge(&mut view, &json!({ "checkInStatus": "CHECKED_IN" })),
            "COMPLETED" => merge(&mut view, &json!({ "checkInStatus": "CHECKED_OUT" })),
            _ => {}
        }
        view
    }
}

/// Nights on an order line: `beckn:quantity` as a number or its `schema:value`
fn nights(line: Option<&Value>) -> f64 {
    number_at(line, "/beckn:quantity/schema:value")
        .or_else(|| number_at(line, "/beckn:quantity"))
        .unwrap_or(DEFAULT_NIGHTS)
}

fn add_on_id(choice: &Value) -> Option<&str> {
    choice.as_str().or_else(|| choice.get("@id").and_then(Value::as_str))
}

fn find_add_on<'a>(catalog: Option<&'a Value>, id: Option<&str>) -> Option<&'a Value> {
    let id = id?;
    catalog?
        .as_array()?
        .iter()
        .find(|add_on| add_on.get("@id").and_then(Value::as_str) == Some(id))
}

/// Add-on price, given either as a number or as a nested price specification
fn add_on_price(add_on: &Value) -> f64 {
    match add_on.get("schema:price") {
        Some(Value::Number(price)) => price.as_f64().unwrap_or(0.0),
        Some(price) => price.get("schema:price").and_then(Value::as_f64).unwrap_or(0.0),
        None => 0.0,
    }
}

fn same_guest(update: &Value, guest: &Value) -> bool {
    ["guestId", "id"]
        .iter()
        .any(|key| at(Some(update), &format!("/{}", key)).is_some() && update.get(key) == guest.get(key))
}

fn random_room() -> Value {
    let mut rng = rand::thread_rng();
    json!(format!("12{}{}", rng.gen_range(0..10), rng.gen_range(0..10)))
}

fn assigned_room(guest: Option<&Value>) -> Value {
    at(guest, "/roomNumber").cloned().unwrap_or_else(random_room)
}

fn guests(sources: &[Option<&Value>]) -> Vec<Value> {
    sources
        .iter()
        .find_map(|source| source.and_then(Value::as_array))
        .cloned()
        .unwrap_or_default()
}

fn order_lines<'a>(prior: Option<&'a Value>, request: Option<&'a Value>) -> Vec<&'a Value> {
    at(prior, "/beckn:orderItems")
        .or_else(|| at(request, "/beckn:orderItems"))
        .and_then(Value::as_array)
        .map(|items| items.iter().collect())
        .unwrap_or_default()
}

fn carried_items(prior: Option<&Value>) -> Value {
    let currency = order_currency(prior).unwrap_or("USD");
    Value::Array(
        order_lines(prior, None)
            .into_iter()
            .map(|item| carried_item(Some(item), None, currency, DEFAULT_NIGHTLY_RATE))
            .collect(),
    )
}

/// Order line carried forward from a prior order, filling gaps with defaults
fn carried_item(item: Option<&Value>, requested: Option<&Value>, currency: &str, rate: f64) -> Value {
    let offer = at(item, "/beckn:acceptedOffer");
    json!({
        "@context": DRAFT_CORE_CONTEXT,
        "@type": "beckn:OrderItem",
        "beckn:lineId": first_or(&[at(item, "/beckn:lineId"), at(requested, "/beckn:lineId")], json!("line-001")),
        "beckn:orderedItem": first_or(
            &[at(item, "/beckn:orderedItem"), at(requested, "/beckn:orderedItem")],
            json!("item-hotel-grand-siam-deluxe"),
        ),
        "beckn:acceptedOffer": {
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Offer",
            "beckn:id": first_or(
                &[at(offer, "/beckn:id"), at(requested, "/beckn:acceptedOffer/beckn:id")],
                json!("offer-grand-siam-deluxe-base"),
            ),
            "beckn:descriptor": first_or(&[at(offer, "/beckn:descriptor")], json!({
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Descriptor",
                "schema:name": "Deluxe Room with Breakfast - 5 Nights",
                "beckn:shortDesc": "Standard rate for 5 nights stay"
            })),
            "beckn:price": first_or(&[at(offer, "/beckn:price")], nightly_price(currency, rate)),
            "beckn:addOnItems": first_or(&[at(offer, "/beckn:addOnItems")], json!([]))
        },
        "beckn:quantity": first_or(
            &[at(item, "/beckn:quantity"), at(requested, "/beckn:quantity")],
            nights_quantity(DEFAULT_NIGHTS),
        ),
        "beckn:price": first_or(&[at(item, "/beckn:price")], nightly_price(currency, rate)),
        "beckn:orderItemAttributes": first_or(&[at(item, "/beckn:orderItemAttributes")], room_attributes())
    })
}

fn cancelled_room(room: Option<&Value>) -> Value {
    let field = |key: &str, fallback: Value| first_or(&[at(room, &format!("/{}", key))], fallback);
    json!({
        "@context": HOTEL_SERVICE_CONTEXT,
        "@type": "beckn:HotelService",
        "hotel:hotelName": field("hotel:hotelName", json!("Grand Siam Hotel")),
        "hotel:roomType": field("hotel:roomType", json!("Deluxe Room")),
        "hotel:bedType": field("hotel:bedType", json!("King")),
        "hotel:maxOccupancy": field("hotel:maxOccupancy", json!(2)),
        "hotel:checkInTime": field("hotel:checkInTime", json!("14:00")),
        "hotel:checkOutTime": field("hotel:checkOutTime", json!("12:00"))
    })
}

fn nightly_price(currency: &str, rate: f64) -> Value {
    json!({
        "@context": DRAFT_CORE_CONTEXT,
        "@type": "schema:PriceSpecification",
        "schema:priceCurrency": currency,
        "schema:price": round2(rate)
    })
}

fn nights_quantity(nights: f64) -> Value {
    json!({ "@type": "schema:QuantitativeValue", "schema:value": nights, "schema:unitCode": "NIGHTS" })
}

/// Stay period: request values first, then the prior order's, then defaults
fn stay_period(requested: Option<&Value>, prior: Option<&Value>, nights: f64) -> Value {
    let field = |key: &str, fallback: Value| first_or(&[at(requested, key), at(prior, key)], fallback);
    json!({
        "@type": "beckn:TimePeriod",
        "schema:startDate": field("/schema:startDate", json!("2025-12-10T14:00:00+07:00")),
        "schema:endDate": field("/schema:endDate", json!("2025-12-15T12:00:00+07:00")),
        "beckn:duration": field("/beckn:duration", json!(format!("P{}D", nights)))
    })
}

fn room_attributes() -> Value {
    json!({
        "@context": HOTEL_SERVICE_CONTEXT,
        "@type": "beckn:HotelService",
        "hotel:hotelName": "Grand Siam Hotel",
        "hotel:roomType": "Deluxe Room",
        "hotel:bedType": "King",
        "hotel:maxOccupancy": 2,
        "hotel:roomSize": 35,
        "hotel:roomSizeUnit": "SQM",
        "hotel:viewType": "City View",
        "hotel:checkInTime": "14:00",
        "hotel:checkOutTime": "12:00",
        "hotel:amenities": {
            "wifi": true,
            "breakfast": true,
            "pool": true,
            "gym": true,
            "parking": true,
            "airConditioning": true,
            "tv": true,
            "minibar": true,
            "safe": true,
            "roomService": true
        }
    })
}

fn default_add_ons(currency: &str) -> Value {
    let add_on = |id: &str, name: &str, description: &str, price: f64| {
        json!({
            "@type": "schema:Offer",
            "@id": id,
            "schema:name": name,
            "schema:description": description,
            "schema:price": { "@type": "schema:PriceSpecification", "schema:priceCurrency": currency, "schema:price": price }
        })
    };
    json!([
        add_on("addon-item-late-checkout", "Late Check-out", "Check-out at 6:00 PM instead of 12:00 PM", 30.0),
        add_on("addon-item-airport-transfer", "Airport Transfer", "One-way airport pickup service", 45.0),
        add_on("addon-item-spa-package", "Spa Package", "60-minute Thai massage at hotel spa", 50.0)
    ])
}

fn hotel_location() -> Value {
    json!([{
        "@type": "beckn:Location",
        "beckn:id": "location-grand-siam-hotel",
        "beckn:address": {
            "@type": "schema:PostalAddress",
            "schema:streetAddress": "123 Sukhumvit Road",
            "schema:addressLocality": "Khlong Toei",
            "schema:addressRegion": "Bangkok",
            "schema:postalCode": "10110",
            "schema:addressCountry": "TH"
        },
        "beckn:geo": { "type": "Point", "coordinates": [100.5698, 13.7563] }
    }])
}

fn default_seller() -> Value {
    json!({
        "@context": DRAFT_CORE_CONTEXT,
        "@type": "beckn:Provider",
        "beckn:id": SELLER_ID,
        "beckn:descriptor": {
            "@type": "beckn:Descriptor",
            "schema:name": "Grand Siam Hotel",
            "beckn:shortDesc": "Luxury hotel in the heart of Bangkok"
        }
    })
}

/// Seller with contact details and location filled in
fn seller_with_contact(seller: Option<&Value>) -> Value {
    let mut result = match seller {
        Some(seller) if seller.get("@type").is_some() => seller.clone(),
        Some(id) => {
            let mut fresh = default_seller();
            merge(&mut fresh, &json!({ "beckn:id": id }));
            fresh
        }
        None => default_seller(),
    };
    let mut descriptor = first_or(&[result.get("beckn:descriptor")], json!({}));
    let contact = json!({
        "schema:telephone": first_or(&[at(Some(&descriptor), "/schema:telephone")], json!("+66 2 123 4567")),
        "schema:email": first_or(&[at(Some(&descriptor), "/schema:email")], json!("reservations@grandsiamhotel.com"))
    });
    merge(&mut descriptor, &contact);
    let locations = first_or(&[result.get("beckn:locations")], hotel_location());
    merge(&mut result, &json!({ "beckn:descriptor": descriptor, "beckn:locations": locations }));
    result
}

fn carried_order_value(prior: Option<&Value>) -> Value {
    first_or(
        &[at(prior, "/beckn:orderValue")],
        json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "schema:PriceSpecification",
            "schema:priceCurrency": "USD",
            "schema:price": DEFAULT_TOTAL,
            "beckn:components": []
        }),
    )
}

fn paid_payment() -> Value {
    json!({
        "@context": DRAFT_CORE_CONTEXT,
        "@type": "beckn:Payment",
        "beckn:type": "PRE_FULFILLMENT",
        "beckn:status": "PAID",
        "beckn:amount": { "@type": "schema:PriceSpecification", "schema:priceCurrency": "USD", "schema:price": DEFAULT_TOTAL }
    })
}

fn booking_id(prior: Option<&Value>) -> String {
    str_at(prior, "/beckn:orderAttributes/bookingId")
        .unwrap_or("HBNK1025")
        .to_string()
}

fn confirmation_document(booking_id: &str) -> Value {
    json!({
        "url": format!("{}/booking-{}-confirmation.pdf", DOCUMENTS_URL, booking_id.to_lowercase()),
        "mimeType": "application/pdf"
    })
}

/// Booking attributes carried through status and update
fn booking_attributes(prior: Option<&Value>, booking_id: &str) -> Value {
    json!({
        "@context": HOTEL_BOOKING_CONTEXT,
        "@type": "beckn:HotelBooking",
        "bookingId": booking_id,
        "bookingReference": first_or(
            &[at(prior, "/beckn:orderAttributes/bookingReference")],
            json!(format!("GS-20251210-{}", booking_id)),
        ),
        "confirmationDocument": first_or(
            &[at(prior, "/beckn:orderAttributes/confirmationDocument")],
            confirmation_document(booking_id),
        ),
        "cancellationPolicy": first_or(
            &[at(prior, "/beckn:orderAttributes/cancellationPolicy")],
            json!({ "freeCancellationUntil": "2025-12-08T23:59:59+07:00", "cancellationFee": CANCELLATION_FEE, "refundable": true }),
        )
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
        HospitalityGenerator::new().generate(action, &input).unwrap()
    }

    fn previous(action: &str, order: Value) -> ContextRecord {
        ContextRecord::new(DOMAIN, action, json!({ "message": { "order": order } }), Value::Null)
    }

    #[test]
    fn test_quote_default_stay() {
        let stay = quote(5.0, 120.0, None, "USD");
        // 600 + 30 + 7% of 630
        assert_eq!(stay.total, 674.1);
        assert_eq!(stay.lines.len(), 3);
        assert_eq!(stay.lines[2].value, 44.1);
    }

    #[test]
    fn test_quote_taxes_add_ons() {
        let stay = quote(5.0, 120.0, Some(("Late Check-out", 30.0)), "USD");
        assert_eq!(stay.lines[1].description, "Add-ons (Late Check-out)");
        // 600 + 30 + 30 + 7% of 660
        assert_eq!(stay.total, 706.2);
    }

    #[test]
    fn test_select_reads_nights_and_rate() {
        let discovery = json!({ "message": { "catalogs": [{
            "beckn:items": [{ "beckn:id": "suite", "beckn:itemAttributes": { "hotel:roomType": "Suite", "hotel:starRating": 5 } }],
            "beckn:offers": [{ "beckn:id": "o-suite", "beckn:items": ["suite"], "beckn:price": { "schema:price": 200.0, "schema:priceCurrency": "USD" } }]
        }]}});
        let prior = ContextRecord::new(DOMAIN, "on_discover", discovery, Value::Null);
        let message = json!({ "order": { "beckn:orderItems": [{
            "beckn:orderedItem": "suite",
            "beckn:quantity": { "schema:value": 2 }
        }]}});

        let order = generate(ResponseAction::OnSelect, message, Some(&prior));

        assert_eq!(order["beckn:orderStatus"], "QUOTE_REQUESTED");
        // 400 + 30 + 7% of 430
        assert_eq!(order["beckn:orderValue"]["schema:price"], 460.1);
        let room = &order["beckn:orderItems"][0]["beckn:orderItemAttributes"];
        assert_eq!(room["hotel:roomType"], "Suite");
        assert!(room.get("hotel:starRating").is_none());
        assert_eq!(order["beckn:fulfillment"]["beckn:time"]["beckn:duration"], "P2D");
    }

    #[test]
    fn test_init_prices_selected_add_ons() {
        let quoted = previous(
            "on_select",
            json!({
                "beckn:orderItems": [{
                    "beckn:quantity": { "schema:value": 5 },
                    "beckn:acceptedOffer": { "beckn:addOnItems": default_add_ons("USD") }
                }],
                "beckn:orderValue": quote(5.0, 120.0, None, "USD").to_price_specification()
            }),
        );
        let message = json!({ "order": { "beckn:orderItems": [{
            "beckn:acceptedOffer": { "beckn:addOnItems": ["addon-item-airport-transfer"] }
        }]}});

        let order = generate(ResponseAction::OnInit, message, Some(&quoted));

        assert_eq!(order["beckn:orderStatus"], "INITIALIZED");
        // 600 + 45 + 30 + 7% of 675
        assert_eq!(order["beckn:orderValue"]["schema:price"], 722.25);
        assert_eq!(order["beckn:payment"]["beckn:status"], "NOT_PAID");
        let kept = order["beckn:orderItems"][0]["beckn:acceptedOffer"]["beckn:addOnItems"].as_array().unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0]["@id"], "addon-item-airport-transfer");
    }

    #[test]
    fn test_confirm_sets_cancellation_policy() {
        let order = generate(ResponseAction::OnConfirm, json!({}), None);
        assert_eq!(order["beckn:orderStatus"], "CONFIRMED");
        let attributes = &order["beckn:orderAttributes"];
        assert!(attributes["bookingId"].as_str().unwrap().starts_with("HBNK"));
        assert_eq!(attributes["cancellationPolicy"]["cancellationFee"], 60.0);
        assert_eq!(attributes["cancellationPolicy"]["refundable"], true);
        assert_eq!(order["beckn:seller"]["beckn:descriptor"]["schema:telephone"], "+66 2 123 4567");
    }

    #[test]
    fn test_status_follows_booking_state() {
        let confirmed = previous(
            "on_confirm",
            json!({ "beckn:orderAttributes": { "bookingId": "HBNK1234", "guests": [{ "guestId": "G1", "name": "Ana" }] } }),
        );

        let booked = generate(ResponseAction::OnStatus, json!({}), Some(&confirmed));
        assert_eq!(booked["beckn:orderStatus"], "CONFIRMED");
        assert_eq!(booked["beckn:orderAttributes"]["guests"][0]["roomNumber"], "TBA");

        let checked_in = json!({ "order": { "beckn:fulfillment": { "beckn:state": "CHECKED_IN" } } });
        let staying = generate(ResponseAction::OnStatus, checked_in, Some(&confirmed));
        assert_eq!(staying["beckn:orderStatus"], "IN_PROGRESS");
        let room = staying["beckn:orderAttributes"]["guests"][0]["roomNumber"].as_str().unwrap().to_string();
        assert!(room.starts_with("12"));

        let checked_out = json!({ "order": { "beckn:fulfillment": { "beckn:state": "CHECKED_OUT" } } });
        let done = generate(ResponseAction::OnStatus, checked_out, Some(&confirmed));
        assert_eq!(done["beckn:orderStatus"], "COMPLETED");
        assert_eq!(done["beckn:orderAttributes"]["guests"][0]["checkInStatus"], "CHECKED_OUT");
        assert_eq!(done["beckn:orderAttributes"]["invoice"]["totalAmount"], 752.25);
    }

    #[test]
    fn test_update_merges_guests_and_assigns_room() {
        let confirmed = previous(
            "on_confirm",
            json!({ "beckn:orderAttributes": { "guests": [{ "guestId": "G1", "name": "Ana", "roomNumber": "TBA" }] } }),
        );
        let message = json!({ "order": { "beckn:orderAttributes": { "guests": [{
            "guestId": "G1", "specialRequests": "High floor", "updateReason": "preference"
        }]}}});

        let order = generate(ResponseAction::OnUpdate, message, Some(&confirmed));

        assert_eq!(order["beckn:orderStatus"], "IN_PROGRESS");
        let guest = &order["beckn:orderAttributes"]["guests"][0];
        assert_eq!(guest["name"], "Ana");
        assert_eq!(guest["specialRequests"], "High floor");
        assert!(guest.get("updateReason").is_none());
        assert_ne!(guest["roomNumber"], "TBA");
        assert!(guest["checkInTime"].is_string());
    }

    #[test]
    fn test_cancel_deducts_fee() {
        let order = generate(ResponseAction::OnCancel, json!({}), None);

        assert_eq!(order["beckn:orderStatus"], "CANCELLED");
        assert_eq!(order["beckn:orderAttributes"]["refundAmount"], 692.25);
        assert_eq!(order["beckn:orderAttributes"]["refundStatus"], "PROCESSED");
        let fee = &order["beckn:orderValue"]["beckn:components"][0];
        assert_eq!(fee["beckn:value"], -60.0);
        assert!(order["beckn:fulfillment"]["beckn:time"].get("beckn:duration").is_none());
    }

    #[test]
    fn test_track_is_not_supported() {
        let generator = HospitalityGenerator::new();
        assert!(!generator.supports(ResponseAction::OnTrack));
        assert!(generator.supports(ResponseAction::OnRating));
    }

    #[test]
    fn test_rating_and_support_shapes() {
        let rating = generate(ResponseAction::OnRating, json!({}), None);
        assert_eq!(rating["aggregate"]["count"], 2848);
        assert_eq!(rating["feedbackForm"]["mime_type"], "text/html");

        let support = generate(ResponseAction::OnSupport, json!({}), None);
        assert_eq!(support["support"]["email"], "support@grandsiamhotel.com");
    }
}
