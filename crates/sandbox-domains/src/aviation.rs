//! Aviation domain
//!
//! Seat bookings on scheduled flights. Select quotes the fare with facility
//! charges and excise tax, init adds paid extras, confirm issues the PNR and
//! cancel refunds the base fare minus the cancellation fee.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sandbox_core::{ContextRecord, DomainConfig, GeneratorError, GeneratorInput, ResponseAction, ResponseGenerator};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::order::{
    at, compact, find_by_id, find_offer_for_item, first_or, first_present, merge, millis_suffix, now_millis,
    number_at, round2, str_at, timestamp, timestamp_in, PriceLine, Quote, DRAFT_CORE_CONTEXT,
};

/// Canonical domain identifier
pub const DOMAIN: &str = "beckn.one:commerce:aviation:1.0";

/// Strings that resolve to this domain
pub const MATCH_PATTERNS: [&str; 5] = [
    "aviation",
    "flight",
    "commerce:aviation",
    "beckn.one:commerce:aviation",
    "beckn.one:commerce:aviation:1.0",
];

const SELLER_ID: &str = "provider-delta-airlines";
const FLIGHT_SERVICE_CONTEXT: &str =
    "https://raw.githubusercontent.com/beckn/protocol-specifications-new/refs/heads/draft/schema/FlightService/v1/context.jsonld";
const FLIGHT_BOOKING_CONTEXT: &str =
    "https://raw.githubusercontent.com/beckn/protocol-specifications-new/refs/heads/draft/schema/FlightBooking/v1/context.jsonld";
const DOCUMENTS_URL: &str = "https://delta-airlines-platform.com";
const DEFAULT_PNR: &str = "DL9X21";

const DEFAULT_FARE: f64 = 280.0;
const DEFAULT_TOTAL: f64 = 392.7;
const FACILITY_CHARGE: f64 = 15.0;
const EXCISE_TAX_PERCENT: f64 = 4.5;
const CANCELLATION_FEE: f64 = 200.0;

/// Paid extras offered with every fare: id, name, description, price and
/// the price component label
const EXTRAS: [(&str, &str, &str, f64, &str); 3] = [
    ("addon-item-checked-baggage", "Checked Baggage", "1 checked bag up to 23kg", 35.0, "Checked baggage"),
    (
        "addon-item-seat-selection",
        "Seat Selection",
        "Choose your preferred seat (Window seat 12A)",
        25.0,
        "Seat selection",
    ),
    (
        "addon-item-travel-insurance",
        "Travel Insurance",
        "Trip cancellation and medical coverage",
        25.0,
        "Travel insurance",
    ),
];

/// Fare quote. Extras are priced as separate lines and the excise tax
/// applies to the fare and extras, not to the facility charge.
pub fn quote(seats: f64, fare: f64, extras: &[(&str, f64)], currency: &str) -> Quote {
    let base = fare * seats;
    let mut lines = vec![PriceLine::new("UNIT", base, format!("Base fare ({} × ${:.2})", seats, fare))];
    let mut taxable = base;
    for (label, price) in extras.iter().filter(|(_, price)| *price > 0.0) {
        taxable += price;
        lines.push(PriceLine::new("UNIT", *price, *label));
    }
    lines.push(PriceLine::new("FEE", FACILITY_CHARGE, "Airport facility charges"));
    lines.push(PriceLine::new(
        "TAX",
        taxable * EXCISE_TAX_PERCENT / 100.0,
        format!("Federal excise tax ({}%)", EXCISE_TAX_PERCENT),
    ));
    Quote::from_lines(currency, lines)
}

/// Response generators for flights
#[derive(Debug, Clone, Default)]
pub struct AviationGenerator;

impl AviationGenerator {
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

        let seats = number_at(line, "/beckn:quantity").unwrap_or(1.0);
        let fare = ["/beckn:price/schema:price", "/beckn:price/value"]
            .iter()
            .find_map(|pointer| number_at(offer, pointer).or_else(|| number_at(item, pointer)))
            .unwrap_or(DEFAULT_FARE);
        let currency = ["/beckn:price/schema:priceCurrency", "/beckn:price/currency"]
            .iter()
            .find_map(|pointer| str_at(offer, pointer).or_else(|| str_at(item, pointer)))
            .unwrap_or("USD");
        let quote = quote(seats, fare, &[], currency);
        debug!(seats, fare, total = quote.total, "Flight fare quoted");

        let economy = str_at(item, "/beckn:itemAttributes/flight:cabinClass") == Some("ECONOMY");
        let descriptor = match at(offer, "/beckn:descriptor") {
            Some(found) => {
                let mut descriptor = json!({ "@context": DRAFT_CORE_CONTEXT, "@type": "beckn:Descriptor" });
                merge(&mut descriptor, found);
                descriptor
            }
            None if economy => fare_descriptor(),
            None => json!({
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Descriptor",
                "schema:name": "Premium Fare",
                "beckn:shortDesc": "Premium fare with enhanced amenities"
            }),
        };
        let attributes = match at(item, "/beckn:itemAttributes") {
            Some(found) => {
                let mut attributes = json!({ "@context": FLIGHT_SERVICE_CONTEXT, "@type": "beckn:FlightService" });
                merge(&mut attributes, found);
                attributes
            }
            None => json!({
                "@context": FLIGHT_SERVICE_CONTEXT,
                "@type": "beckn:FlightService",
                "flight:flightNumber": "DL145",
                "flight:airline": "Delta Air Lines",
                "flight:airlineCode": "DL",
                "flight:cabinClass": "ECONOMY"
            }),
        };

        json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:orderStatus": "QUOTE_PROVIDED",
            "beckn:seller": first_or(&[at(item, "/beckn:provider/beckn:id"), at(request, "/beckn:seller")], json!(SELLER_ID)),
            "beckn:orderItems": [{
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:OrderItem",
                "beckn:lineId": first_or(&[at(line, "/beckn:lineId")], json!("line-001")),
                "beckn:orderedItem": first_or(&[item_id, at(item, "/beckn:id")], json!("item-flight-dl145-economy")),
                "beckn:quantity": seats,
                "beckn:acceptedOffer": {
                    "@context": DRAFT_CORE_CONTEXT,
                    "@type": "beckn:Offer",
                    "beckn:id": first_or(
                        &[at(offer, "/beckn:id")],
                        json!(format!("offer-{}-base", item_id.and_then(Value::as_str).unwrap_or("flight"))),
                    ),
                    "beckn:descriptor": descriptor,
                    "beckn:price": fare_price(currency, fare),
                    "beckn:addOnItems": EXTRAS.iter().map(|extra| extra_offer(*extra)).collect::<Vec<_>>()
                },
                "beckn:price": fare_price(currency, fare),
                "beckn:orderItemAttributes": attributes
            }],
            "beckn:orderValue": quote.to_price_specification(),
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-flight-{}", now_millis())),
                ),
                "beckn:mode": "FLIGHT",
                "beckn:status": "AVAILABLE"
            }
        })
    }

    fn on_init(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let quoted = input.prior_order();
        let quoted_line = at(quoted, "/beckn:orderItems/0");
        let quoted_offer = at(quoted_line, "/beckn:acceptedOffer");
        let fare = number_at(quoted_offer, "/beckn:price/schema:price").unwrap_or(DEFAULT_FARE);
        let currency = str_at(quoted_offer, "/beckn:price/schema:priceCurrency").unwrap_or("USD");
        let seats = number_at(quoted_line, "/beckn:quantity").unwrap_or(1.0);

        let offered = at(quoted_offer, "/beckn:addOnItems");
        let chosen: Vec<Value> = at(request, "/beckn:orderItems/0/beckn:acceptedOffer/beckn:addOnItems")
            .and_then(Value::as_array)
            .map(|choices| {
                choices
                    .iter()
                    .map(|choice| {
                        let id = choice.get("@id").and_then(Value::as_str).or_else(|| choice.as_str());
                        find_extra(offered, id)
                            .cloned()
                            .or_else(|| known_extra(id).map(extra_offer))
                            .unwrap_or_else(|| choice.clone())
                    })
                    .collect()
            })
            .unwrap_or_default();
        let add_ons = if chosen.is_empty() {
            first_or(&[offered], json!([]))
        } else {
            Value::Array(chosen)
        };

        let extras: Vec<(&str, f64)> = EXTRAS
            .iter()
            .map(|(id, _, _, _, label)| (*label, extra_price(&add_ons, id)))
            .collect();
        let quote = quote(seats, fare, &extras, currency);
        let total = quote.total;

        let items: Vec<Value> = at(request, "/beckn:orderItems")
            .or_else(|| at(quoted, "/beckn:orderItems"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        compact(json!({
                            "@context": DRAFT_CORE_CONTEXT,
                            "@type": "beckn:OrderItem",
                            "beckn:lineId": first_or(&[at(Some(item), "/beckn:lineId"), at(quoted_line, "/beckn:lineId")], json!("line-001")),
                            "beckn:orderedItem": first_present(&[at(Some(item), "/beckn:orderedItem"), at(quoted_line, "/beckn:orderedItem")]),
                            "beckn:quantity": first_or(&[at(Some(item), "/beckn:quantity"), at(quoted_line, "/beckn:quantity")], json!(1)),
                            "beckn:acceptedOffer": compact(json!({
                                "@context": DRAFT_CORE_CONTEXT,
                                "@type": "beckn:Offer",
                                "beckn:id": first_present(&[at(quoted_offer, "/beckn:id"), at(Some(item), "/beckn:acceptedOffer/beckn:id")]),
                                "beckn:descriptor": first_or(&[at(quoted_offer, "/beckn:descriptor")], fare_descriptor()),
                                "beckn:price": first_or(&[at(quoted_offer, "/beckn:price")], fare_price(currency, fare)),
                                "beckn:addOnItems": add_ons
                            })),
                            "beckn:price": first_or(&[at(quoted_line, "/beckn:price")], fare_price(currency, fare)),
                            "beckn:orderItemAttributes": first_or(&[at(quoted_line, "/beckn:orderItemAttributes")], json!({}))
                        }))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut order_value = quote.to_price_specification();
        if let Some(context) = at(quoted, "/beckn:orderValue/@context") {
            merge(&mut order_value, &json!({ "@context": context }));
        }
        let mut attributes = first_or(&[at(request, "/beckn:orderAttributes")], json!({}));
        merge(
            &mut attributes,
            &json!({
                "@context": first_or(&[at(request, "/beckn:orderAttributes/@context")], json!(FLIGHT_BOOKING_CONTEXT)),
                "@type": first_or(&[at(request, "/beckn:orderAttributes/@type")], json!("FlightBooking")),
                "passengers": first_or(&[at(request, "/beckn:orderAttributes/passengers")], json!([])),
                "cancellationTerms": cancellation_terms()
            }),
        );

        compact(json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(quoted, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-flight-{}", now_millis()))),
            "beckn:orderNumber": format!("BK-{}", millis_suffix(6)),
            "beckn:orderStatus": "INITIALIZED",
            "beckn:seller": first_or(&[at(quoted, "/beckn:seller"), at(request, "/beckn:seller")], default_seller()),
            "beckn:buyer": first_or(&[at(request, "/beckn:buyer"), at(quoted, "/beckn:buyer")], default_buyer()),
            "beckn:orderItems": items,
            "beckn:orderValue": order_value,
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id"), at(quoted, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-flight-{}", now_millis())),
                ),
                "beckn:mode": "FLIGHT",
                "beckn:status": "PENDING"
            },
            "beckn:payment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Payment",
                "beckn:id": first_or(&[at(request, "/beckn:payment/beckn:id")], json!(format!("payment-{}", now_millis()))),
                "beckn:status": "NOT-PAID",
                "beckn:amount": amount(currency, total),
                "beckn:beneficiary": "BPP",
                "beckn:acceptedPaymentMethod": first_or(
                    &[at(request, "/beckn:payment/beckn:acceptedPaymentMethod")],
                    json!(["Card", "Wallet", "UPI"]),
                )
            },
            "beckn:orderAttributes": attributes
        }))
    }

    fn on_confirm(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let initialized = input.prior_order();
        let init_line = at(initialized, "/beckn:orderItems/0");
        let init_offer = at(init_line, "/beckn:acceptedOffer");

        let offered = at(init_offer, "/beckn:addOnItems");
        let add_ons = match at(request, "/beckn:orderItems/0/beckn:acceptedOffer/beckn:addOnItems")
            .and_then(Value::as_array)
            .filter(|choices| !choices.is_empty())
        {
            Some(choices) => Value::Array(
                choices
                    .iter()
                    .map(|choice| {
                        find_extra(offered, choice.get("@id").and_then(Value::as_str))
                            .cloned()
                            .unwrap_or_else(|| choice.clone())
                    })
                    .collect(),
            ),
            None => first_or(&[offered], json!([])),
        };

        let mut components = first_or(&[at(initialized, "/beckn:orderValue/beckn:components")], json!([]));
        if let Some(lines) = components.as_array_mut() {
            for line in lines.iter_mut() {
                let Some(label) = extra_label(line) else { continue };
                let value = number_at(Some(&*line), "/beckn:value").unwrap_or(0.0);
                merge(line, &json!({ "beckn:description": format!("{} (1 × ${:.2})", label, value) }));
            }
        }

        let pnr = generate_pnr();
        let order_number = first_or(
            &[at(initialized, "/beckn:orderNumber"), at(request, "/beckn:orderNumber")],
            json!(format!("BK-{}", millis_suffix(6))),
        );
        let passengers: Vec<Value> = passengers(&[
            at(request, "/beckn:orderAttributes/passengers"),
            at(initialized, "/beckn:orderAttributes/passengers"),
        ])
        .into_iter()
        .map(|mut passenger| {
            let seat = if str_at(Some(&passenger), "/seatPreference") == Some("WINDOW") { "12A" } else { "12B" };
            let ticket = format!("006{:09}", rand::thread_rng().gen_range(0..1_000_000_000u32));
            let assigned = json!({
                "assignedSeat": first_or(&[at(Some(&passenger), "/assignedSeat")], json!(seat)),
                "ticketNumber": first_or(&[at(Some(&passenger), "/ticketNumber")], json!(ticket)),
            });
            merge(&mut passenger, &assigned);
            passenger
        })
        .collect();

        let items: Vec<Value> = at(request, "/beckn:orderItems")
            .or_else(|| at(initialized, "/beckn:orderItems"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        compact(json!({
                            "@context": DRAFT_CORE_CONTEXT,
                            "@type": "beckn:OrderItem",
                            "beckn:lineId": first_or(&[at(Some(item), "/beckn:lineId"), at(init_line, "/beckn:lineId")], json!("line-001")),
                            "beckn:orderedItem": first_present(&[at(Some(item), "/beckn:orderedItem"), at(init_line, "/beckn:orderedItem")]),
                            "beckn:quantity": first_or(&[at(Some(item), "/beckn:quantity"), at(init_line, "/beckn:quantity")], json!(1)),
                            "beckn:acceptedOffer": compact(json!({
                                "@context": DRAFT_CORE_CONTEXT,
                                "@type": "beckn:Offer",
                                "beckn:id": first_present(&[at(init_offer, "/beckn:id"), at(Some(item), "/beckn:acceptedOffer/beckn:id")]),
                                "beckn:descriptor": first_or(&[at(init_offer, "/beckn:descriptor")], fare_descriptor()),
                                "beckn:price": first_or(&[at(init_offer, "/beckn:price")], fare_price("USD", DEFAULT_FARE)),
                                "beckn:addOnItems": add_ons
                            })),
                            "beckn:price": first_or(&[at(init_line, "/beckn:price")], fare_price("USD", DEFAULT_FARE)),
                            "beckn:orderItemAttributes": first_or(&[at(init_line, "/beckn:orderItemAttributes")], json!({}))
                        }))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut order_value = first_or(&[at(initialized, "/beckn:orderValue")], json!({}));
        merge(
            &mut order_value,
            &json!({
                "@context": first_or(&[at(initialized, "/beckn:orderValue/@context")], json!(DRAFT_CORE_CONTEXT)),
                "@type": "schema:PriceSpecification",
                "schema:priceCurrency": first_or(&[at(initialized, "/beckn:orderValue/schema:priceCurrency")], json!("USD")),
                "schema:price": first_or(&[at(initialized, "/beckn:orderValue/schema:price")], json!(DEFAULT_TOTAL)),
                "beckn:components": components
            }),
        );

        let mut attributes = first_or(&[at(initialized, "/beckn:orderAttributes")], json!({}));
        merge(
            &mut attributes,
            &json!({
                "@context": first_or(&[at(initialized, "/beckn:orderAttributes/@context")], json!(FLIGHT_BOOKING_CONTEXT)),
                "@type": first_or(&[at(initialized, "/beckn:orderAttributes/@type")], json!("FlightBooking")),
                "pnr": pnr,
                "bookingReference": first_or(&[at(initialized, "/beckn:orderNumber")], json!(format!("BK-{}", millis_suffix(6)))),
                "passengers": passengers,
                "confirmationDocument": confirmation_document(&pnr),
                "eTicket": e_ticket(&pnr),
                "cancellationTerms": first_or(&[at(initialized, "/beckn:orderAttributes/cancellationTerms")], cancellation_terms())
            }),
        );

        compact(json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(initialized, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-flight-{}", now_millis()))),
            "beckn:orderNumber": order_number,
            "beckn:orderStatus": "CONFIRMED",
            "beckn:seller": first_or(&[at(initialized, "/beckn:seller"), at(request, "/beckn:seller")], default_seller()),
            "beckn:buyer": first_or(&[at(request, "/beckn:buyer"), at(initialized, "/beckn:buyer")], default_buyer()),
            "beckn:orderItems": items,
            "beckn:orderValue": order_value,
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id"), at(initialized, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-flight-{}", now_millis())),
                ),
                "beckn:mode": "FLIGHT",
                "beckn:status": "BOOKED"
            },
            "beckn:payment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Payment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:payment/beckn:id"), at(initialized, "/beckn:payment/beckn:id")],
                    json!(format!("payment-{}", now_millis())),
                ),
                "beckn:status": "PAID",
                "beckn:amount": first_or(
                    &[at(request, "/beckn:payment/beckn:amount"), at(initialized, "/beckn:payment/beckn:amount")],
                    amount("USD", DEFAULT_TOTAL),
                ),
                "beckn:txnRef": first_or(&[at(request, "/beckn:payment/beckn:txnRef")], json!(format!("TXN-{}", now_millis()))),
                "beckn:beneficiary": "BPP",
                "beckn:acceptedPaymentMethod": first_or(
                    &[
                        at(request, "/beckn:payment/beckn:acceptedPaymentMethod"),
                        at(initialized, "/beckn:payment/beckn:acceptedPaymentMethod"),
                    ],
                    json!(["Card"]),
                )
            },
            "beckn:orderAttributes": attributes
        }))
    }

    fn on_status(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let confirmed = input.prior_order();
        let pnr = pnr(confirmed);

        let items: Vec<Value> = lines(confirmed)
            .into_iter()
            .map(|item| {
                let attributes = at(Some(item), "/beckn:orderItemAttributes");
                let mut updated = first_or(&[attributes], json!({}));
                merge(
                    &mut updated,
                    &json!({
                        "flight:flightStatus": "SCHEDULED",
                        "flight:departureAirport": with_gate(at(attributes, "/flight:departureAirport"), "D7"),
                        "flight:arrivalAirport": with_gate(at(attributes, "/flight:arrivalAirport"), "B22")
                    }),
                );
                let mut item = item.clone();
                merge(&mut item, &json!({ "beckn:orderItemAttributes": updated }));
                item
            })
            .collect();

        let passengers: Vec<Value> = passengers(&[at(confirmed, "/beckn:orderAttributes/passengers")])
            .into_iter()
            .map(|mut passenger| {
                let pax = passenger_ref(&passenger);
                let boarding_pass = json!({
                    "url": format!("{}/boardingpass/{}-PAX{}.pdf", DOCUMENTS_URL, pnr, pax),
                    "mimeType": "application/pdf",
                    "qrCode": format!("{}/boardingpass/qr/{}-PAX{}.png", DOCUMENTS_URL, pnr, pax),
                    "barcode": barcode(&passenger, &pnr, "", str_at(Some(&passenger), "/assignedSeat").unwrap_or("12A"), "001D007B")
                });
                merge(
                    &mut passenger,
                    &json!({ "checkInStatus": "CHECKED_IN", "checkInTime": timestamp(), "boardingPass": boarding_pass }),
                );
                passenger
            })
            .collect();

        let mut attributes = booking_attributes(confirmed, &pnr);
        merge(
            &mut attributes,
            &json!({
                "passengers": passengers,
                "checkInDetails": {
                    "checkInOpenTime": timestamp_in(chrono::Duration::hours(24)),
                    "checkInCloseTime": timestamp_in(chrono::Duration::hours(25)),
                    "boardingTime": timestamp_in(chrono::Duration::minutes(25 * 60 + 30)),
                    "gate": "D7",
                    "terminal": "2"
                }
            }),
        );

        compact(json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(confirmed, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-flight-{}", now_millis()))),
            "beckn:orderNumber": first_or(&[at(confirmed, "/beckn:orderNumber")], json!(format!("BK-{}", millis_suffix(6)))),
            "beckn:orderStatus": "IN_PROGRESS",
            "beckn:seller": first_or(&[at(confirmed, "/beckn:seller")], default_seller()),
            "beckn:buyer": first_present(&[at(confirmed, "/beckn:buyer")]),
            "beckn:orderItems": items,
            "beckn:orderValue": carried_order_value(confirmed),
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(&[at(confirmed, "/beckn:fulfillment/beckn:id")], json!(format!("fulfillment-flight-{}", now_millis()))),
                "beckn:mode": "FLIGHT",
                "beckn:status": "CHECKED_IN",
                "beckn:trackingAction": tracking_action(&pnr)
            },
            "beckn:payment": first_or(&[at(confirmed, "/beckn:payment")], paid_payment(None)),
            "beckn:orderAttributes": attributes
        }))
    }

    fn on_update(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let confirmed = input.prior_order();
        let pnr = pnr(confirmed);
        let flight = at(confirmed, "/beckn:orderItems/0/beckn:orderItemAttributes");
        let existing_check_in = at(confirmed, "/beckn:orderAttributes/checkInDetails");
        let requested_check_in = at(request, "/beckn:orderAttributes/checkInDetails");

        let old_gate = str_at(existing_check_in, "/gate").or_else(|| str_at(flight, "/flight:departureAirport/gate"));
        let new_gate = str_at(requested_check_in, "/gate");
        let gate = new_gate.or(old_gate).unwrap_or("D14B");
        let route = format!(
            "{}{} {}",
            str_at(flight, "/flight:departureAirport/code").unwrap_or("SFO"),
            str_at(flight, "/flight:arrivalAirport/code").unwrap_or("JFK"),
            str_at(flight, "/flight:flightNumber").unwrap_or("DL145"),
        );

        let updates = passengers(&[at(request, "/beckn:orderAttributes/passengers")]);
        let existing = passengers(&[at(confirmed, "/beckn:orderAttributes/passengers")]);
        let merged: Vec<Value> = if existing.is_empty() {
            updates
                .iter()
                .map(|update| boarded_passenger(update.clone(), None, &pnr, &route))
                .collect()
        } else {
            existing
                .into_iter()
                .map(|passenger| {
                    let update = updates.iter().find(|update| same_passenger(update, &passenger));
                    boarded_passenger(passenger, update, &pnr, &route)
                })
                .collect()
        };

        let items: Vec<Value> = lines(confirmed)
            .into_iter()
            .map(|item| {
                let mut departure = first_or(&[at(flight, "/flight:departureAirport")], json!({}));
                merge(&mut departure, &json!({ "gate": gate }));
                let mut attributes = first_or(&[flight], json!({}));
                merge(
                    &mut attributes,
                    &json!({ "flight:departureAirport": departure, "flight:flightStatus": "BOARDING" }),
                );
                json!({
                    "@context": DRAFT_CORE_CONTEXT,
                    "@type": "beckn:OrderItem",
                    "beckn:lineId": first_or(&[at(Some(item), "/beckn:lineId")], json!("line-001")),
                    "beckn:orderedItem": first_present(&[at(Some(item), "/beckn:orderedItem")]),
                    "beckn:quantity": first_or(&[at(Some(item), "/beckn:quantity")], json!(1)),
                    "beckn:acceptedOffer": first_or(&[at(confirmed, "/beckn:orderItems/0/beckn:acceptedOffer")], json!({})),
                    "beckn:price": first_or(&[at(confirmed, "/beckn:orderItems/0/beckn:price")], json!({})),
                    "beckn:orderItemAttributes": attributes
                })
            })
            .collect();

        let mut check_in = json!({
            "checkInOpenTime": first_or(&[at(existing_check_in, "/checkInOpenTime"), at(requested_check_in, "/checkInOpenTime")], json!("2025-12-14T09:30:00-08:00")),
            "checkInCloseTime": first_or(&[at(existing_check_in, "/checkInCloseTime"), at(requested_check_in, "/checkInCloseTime")], json!("2025-12-15T08:30:00-08:00")),
            "boardingTime": first_or(&[at(existing_check_in, "/boardingTime"), at(requested_check_in, "/boardingTime")], json!("2025-12-15T09:00:00-08:00")),
            "gate": gate,
            "terminal": first_or(
                &[at(requested_check_in, "/terminal"), at(existing_check_in, "/terminal"), at(flight, "/flight:departureAirport/terminal")],
                json!("2"),
            )
        });
        if let (Some(old), Some(new)) = (old_gate, new_gate) {
            if old != new {
                let at_time = chrono::Utc::now().format("%I:%M %p");
                merge(
                    &mut check_in,
                    &json!({ "gateChangeNotification": format!("Gate changed from {} to {} at {}", old, new, at_time) }),
                );
            }
        }

        let mut attributes = booking_attributes(confirmed, &pnr);
        merge(&mut attributes, &json!({ "passengers": merged, "checkInDetails": check_in }));

        compact(json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(confirmed, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-flight-{}", now_millis()))),
            "beckn:orderNumber": first_or(&[at(confirmed, "/beckn:orderNumber")], json!(format!("BK-{}", millis_suffix(6)))),
            "beckn:orderStatus": "IN_PROGRESS",
            "beckn:seller": first_or(&[at(confirmed, "/beckn:seller"), at(request, "/beckn:seller")], default_seller()),
            "beckn:buyer": first_present(&[at(request, "/beckn:buyer"), at(confirmed, "/beckn:buyer")]),
            "beckn:orderItems": items,
            "beckn:orderValue": carried_order_value(confirmed),
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id"), at(confirmed, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-flight-{}", now_millis())),
                ),
                "beckn:mode": "FLIGHT",
                "beckn:status": "BOARDING",
                "beckn:trackingAction": tracking_action(&pnr)
            },
            "beckn:payment": paid_payment(confirmed),
            "beckn:orderAttributes": attributes
        }))
    }

    fn on_cancel(&self, input: &GeneratorInput<'_>) -> Value {
        let request = input.order();
        let confirmed = input.prior_order();
        let currency = str_at(confirmed, "/beckn:orderValue/schema:priceCurrency").unwrap_or("USD");

        let base_components: Vec<Value> = at(confirmed, "/beckn:orderValue/beckn:components")
            .and_then(Value::as_array)
            .map(|components| {
                components
                    .iter()
                    .filter(|component| extra_label(component).is_none())
                    .map(|component| {
                        let mut component = component.clone();
                        if let Some(description) = str_at(Some(&component), "/beckn:description") {
                            let simplified = strip_quantity(description);
                            merge(&mut component, &json!({ "beckn:description": simplified }));
                        }
                        component
                    })
                    .collect()
            })
            .unwrap_or_default();
        let base_value = round2(
            base_components
                .iter()
                .filter_map(|component| component.get("beckn:value").and_then(Value::as_f64))
                .sum(),
        );

        let term = at(confirmed, "/beckn:orderAttributes/cancellationTerms/0");
        let fee = number_at(term, "/cancellationFee").unwrap_or(CANCELLATION_FEE);
        let refund_eligible = match term {
            Some(term) => term.get("refundEligible").and_then(Value::as_bool).unwrap_or(false),
            None => true,
        };
        let refund = if refund_eligible { round2(base_value - fee) } else { 0.0 };
        debug!(base_value, fee, refund, "Flight booking cancelled");

        let confirmed_line = at(confirmed, "/beckn:orderItems/0");
        let confirmed_offer = at(confirmed_line, "/beckn:acceptedOffer");
        let flight = at(confirmed_line, "/beckn:orderItemAttributes");
        let flight_field = |key: &str| first_or(&[at(flight, key)], json!(""));
        let items: Vec<Value> = at(request, "/beckn:orderItems")
            .or_else(|| at(confirmed, "/beckn:orderItems"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        compact(json!({
                            "@context": DRAFT_CORE_CONTEXT,
                            "@type": "beckn:OrderItem",
                            "beckn:lineId": first_or(&[at(Some(item), "/beckn:lineId"), at(confirmed_line, "/beckn:lineId")], json!("line-001")),
                            "beckn:orderedItem": first_present(&[at(Some(item), "/beckn:orderedItem"), at(confirmed_line, "/beckn:orderedItem")]),
                            "beckn:quantity": first_or(&[at(Some(item), "/beckn:quantity"), at(confirmed_line, "/beckn:quantity")], json!(1)),
                            "beckn:acceptedOffer": compact(json!({
                                "@context": DRAFT_CORE_CONTEXT,
                                "@type": "beckn:Offer",
                                "beckn:id": first_present(&[at(confirmed_offer, "/beckn:id"), at(Some(item), "/beckn:acceptedOffer/beckn:id")]),
                                "beckn:descriptor": first_or(&[at(confirmed_offer, "/beckn:descriptor")], fare_descriptor()),
                                "beckn:price": first_or(&[at(confirmed_offer, "/beckn:price")], fare_price("USD", DEFAULT_FARE)),
                                "beckn:addOnItems": first_or(&[at(confirmed_offer, "/beckn:addOnItems")], json!([]))
                            })),
                            "beckn:price": first_or(&[at(confirmed_line, "/beckn:price")], fare_price("USD", DEFAULT_FARE)),
                            "beckn:orderItemAttributes": compact(json!({
                                "@context": FLIGHT_SERVICE_CONTEXT,
                                "@type": "beckn:FlightService",
                                "flight:flightNumber": flight_field("/flight:flightNumber"),
                                "flight:airline": flight_field("/flight:airline"),
                                "flight:airlineCode": flight_field("/flight:airlineCode"),
                                "flight:departureAirport": {
                                    "code": flight_field("/flight:departureAirport/code"),
                                    "name": flight_field("/flight:departureAirport/name")
                                },
                                "flight:arrivalAirport": {
                                    "code": flight_field("/flight:arrivalAirport/code"),
                                    "name": flight_field("/flight:arrivalAirport/name")
                                },
                                "flight:departureTime": first_present(&[at(flight, "/flight:departureTime")]),
                                "flight:arrivalTime": first_present(&[at(flight, "/flight:arrivalTime")]),
                                "flight:duration": first_present(&[at(flight, "/flight:duration")]),
                                "flight:cabinClass": first_or(&[at(flight, "/flight:cabinClass")], json!("ECONOMY"))
                            }))
                        }))
                    })
                    .collect()
            })
            .unwrap_or_default();

        compact(json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(confirmed, "/beckn:id"), at(request, "/beckn:id")], json!(format!("order-flight-{}", now_millis()))),
            "beckn:orderNumber": first_or(&[at(confirmed, "/beckn:orderNumber")], json!(format!("BK-{}", millis_suffix(6)))),
            "beckn:orderStatus": "CANCELLED",
            "beckn:seller": first_or(&[at(confirmed, "/beckn:seller"), at(request, "/beckn:seller")], default_seller()),
            "beckn:buyer": first_present(&[at(request, "/beckn:buyer"), at(confirmed, "/beckn:buyer")]),
            "beckn:orderItems": items,
            "beckn:orderValue": {
                "@context": first_or(&[at(confirmed, "/beckn:orderValue/@context")], json!(DRAFT_CORE_CONTEXT)),
                "@type": "schema:PriceSpecification",
                "schema:priceCurrency": currency,
                "schema:price": base_value,
                "beckn:components": base_components
            },
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:fulfillment/beckn:id"), at(confirmed, "/beckn:fulfillment/beckn:id")],
                    json!(format!("fulfillment-flight-{}", now_millis())),
                ),
                "beckn:mode": "FLIGHT",
                "beckn:status": "CANCELLED"
            },
            "beckn:payment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Payment",
                "beckn:id": first_or(
                    &[at(request, "/beckn:payment/beckn:id"), at(confirmed, "/beckn:payment/beckn:id")],
                    json!(format!("payment-{}", now_millis())),
                ),
                "beckn:status": "REFUNDED",
                "beckn:amount": amount(currency, base_value),
                "beckn:txnRef": first_or(&[at(confirmed, "/beckn:payment/beckn:txnRef")], json!(format!("TXN-{}", now_millis()))),
                "beckn:refundRef": format!("REFUND-{}", now_millis()),
                "beckn:refundedAt": timestamp(),
                "beckn:beneficiary": "BAP"
            },
            "beckn:orderAttributes": {
                "@context": FLIGHT_BOOKING_CONTEXT,
                "@type": "FlightBooking",
                "pnr": first_or(&[at(confirmed, "/beckn:orderAttributes/pnr")], json!(generate_pnr())),
                "bookingReference": first_or(&[at(confirmed, "/beckn:orderNumber")], json!(format!("BK-{}", millis_suffix(6)))),
                "cancellationDate": timestamp(),
                "cancellationFee": fee,
                "refundAmount": refund,
                "refundStatus": "PROCESSED"
            }
        }))
    }

    fn on_track(&self, input: &GeneratorInput<'_>) -> Value {
        let confirmed = input.prior_order();
        let pnr = pnr(confirmed);
        let flight = at(confirmed, "/beckn:orderItems/0/beckn:orderItemAttributes");
        let items: Vec<Value> = lines(confirmed)
            .into_iter()
            .map(|item| {
                json!({
                    "beckn:lineId": first_present(&[item.get("beckn:lineId")]),
                    "beckn:orderedItem": first_present(&[item.get("beckn:orderedItem")])
                })
            })
            .collect();

        json!({
            "@context": DRAFT_CORE_CONTEXT,
            "@type": "beckn:Order",
            "beckn:id": first_or(&[at(confirmed, "/beckn:id")], json!(format!("order-flight-{}", now_millis()))),
            "beckn:orderStatus": "IN_PROGRESS",
            "beckn:orderItems": items,
            "beckn:fulfillment": {
                "@context": DRAFT_CORE_CONTEXT,
                "@type": "beckn:Fulfillment",
                "beckn:id": first_or(&[at(confirmed, "/beckn:fulfillment/beckn:id")], json!(format!("fulfillment-flight-{}", now_millis()))),
                "beckn:mode": "FLIGHT",
                "beckn:status": "IN_TRANSIT",
                "beckn:trackingAction": tracking_action(&pnr),
                "deliveryAttributes": {
                    "@context": FLIGHT_SERVICE_CONTEXT,
                    "@type": "beckn:FlightService",
                    "flight:flightStatus": "IN_FLIGHT",
                    "flight:currentLocation": {
                        "latitude": 40.7128,
                        "longitude": -74.006,
                        "altitude": 35000,
                        "altitudeUnit": "FT"
                    },
                    "flight:estimatedArrivalTime": first_or(
                        &[at(flight, "/flight:arrivalTime")],
                        json!(timestamp_in(chrono::Duration::hours(5))),
                    ),
                    "flight:departureAirport": first_or(&[at(flight, "/flight:departureAirport")], json!({})),
                    "flight:arrivalAirport": first_or(&[at(flight, "/flight:arrivalAirport")], json!({}))
                }
            }
        })
    }

    fn on_rating(&self) -> Value {
        json!({
            "received": true,
            "aggregate": { "count": 1247, "value": 4.73, "best": 5, "worst": 1 },
            "feedbackForm": {
                "id": format!("detailed-flight-feedback-{}", now_millis()),
                "name": "Detailed Flight Experience Feedback",
                "url": format!("https://feedback.delta.com/detailed/flight-{}", now_millis()),
                "mime_type": "text/html"
            }
        })
    }

    fn on_support(&self) -> Value {
        json!({
            "support": {
                "name": "Delta Air Lines Customer Support",
                "phone": "+1-800-221-1212",
                "email": "support@delta.com",
                "url": "https://delta.com/contact",
                "hours": "24/7",
                "channels": ["phone", "email", "web", "chat"]
            }
        })
    }
}

impl ResponseGenerator for AviationGenerator {
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
    DomainConfig::new(DOMAIN, Arc::new(AviationGenerator::new())).with_patterns(MATCH_PATTERNS)
}

/// Booking code: carrier prefix plus five random characters
fn generate_pnr() -> String {
    let code: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(5)
        .map(char::from)
        .collect();
    format!("DL{}", code.to_uppercase())
}

fn pnr(order: Option<&Value>) -> String {
    str_at(order, "/beckn:orderAttributes/pnr").unwrap_or(DEFAULT_PNR).to_string()
}

fn lines(order: Option<&Value>) -> Vec<&Value> {
    at(order, "/beckn:orderItems")
        .and_then(Value::as_array)
        .map(|items| items.iter().collect())
        .unwrap_or_default()
}

fn passengers(sources: &[Option<&Value>]) -> Vec<Value> {
    sources
        .iter()
        .find_map(|source| source.and_then(Value::as_array))
        .cloned()
        .unwrap_or_default()
}

fn extra_offer((id, name, description, price, _): (&str, &str, &str, f64, &str)) -> Value {
    json!({
        "@type": "schema:Offer",
        "@id": id,
        "schema:name": name,
        "schema:description": description,
        "schema:price": { "@type": "schema:PriceSpecification", "schema:priceCurrency": "USD", "schema:price": price }
    })
}

fn known_extra(id: Option<&str>) -> Option<(&'static str, &'static str, &'static str, f64, &'static str)> {
    let id = id?;
    EXTRAS.iter().copied().find(|extra| extra.0 == id)
}

fn find_extra<'a>(offered: Option<&'a Value>, id: Option<&str>) -> Option<&'a Value> {
    let id = id?;
    offered?
        .as_array()?
        .iter()
        .find(|add_on| add_on.get("@id").and_then(Value::as_str) == Some(id))
}

/// Price of the extra `id` among `add_ons`, zero when not chosen
fn extra_price(add_ons: &Value, id: &str) -> f64 {
    find_extra(Some(add_ons), Some(id))
        .and_then(|add_on| number_at(Some(add_on), "/schema:price/schema:price"))
        .unwrap_or(0.0)
}

/// Label of the extra a price component charges for, if any
fn extra_label(component: &Value) -> Option<&'static str> {
    let description = component.get("beckn:description")?.as_str()?.to_lowercase();
    EXTRAS
        .iter()
        .map(|extra| extra.4)
        .find(|label| description.contains(&label.to_lowercase()))
}

/// Drop a trailing ` (n × $x.xx)` from a component description
fn strip_quantity(description: &str) -> String {
    match description.rfind(" (") {
        Some(start) if description.ends_with(')') && description[start..].contains('×') => {
            description[..start].to_string()
        }
        _ => description.to_string(),
    }
}

fn same_passenger(update: &Value, passenger: &Value) -> bool {
    let Some(id) = str_at(Some(passenger), "/id") else {
        return false;
    };
    let short = id.trim_start_matches("pax-").to_uppercase();
    let pax = format!("PAX{}", short);
    ["passengerId", "id"].iter().any(|key| {
        str_at(Some(update), &format!("/{}", key))
            .map(|candidate| candidate == id || candidate == pax || candidate == short)
            .unwrap_or(false)
    })
}

fn passenger_ref(passenger: &Value) -> String {
    str_at(Some(passenger), "/id")
        .map(str::to_uppercase)
        .unwrap_or_else(|| "001".to_string())
}

fn barcode(passenger: &Value, pnr: &str, route: &str, seat: &str, suffix: &str) -> String {
    let last = str_at(Some(passenger), "/lastName").unwrap_or("BECKN").to_uppercase();
    let first = str_at(Some(passenger), "/firstName").unwrap_or("FIDE");
    if route.is_empty() {
        format!("M1{}/{}           E{} {}{}", last, first, pnr, seat, suffix)
    } else {
        format!("M1{}/{}           E{} {} {}{}", last, first, pnr, route, seat, suffix)
    }
}

/// Passenger after an update: seat changes applied, check-in and boarding
/// pass present, request-only fields removed
fn boarded_passenger(mut passenger: Value, update: Option<&Value>, pnr: &str, route: &str) -> Value {
    let previous_seat = str_at(Some(&passenger), "/assignedSeat").map(str::to_string);
    if let Some(update) = update {
        let changes = json!({
            "assignedSeat": first_present(&[at(Some(update), "/assignedSeat"), at(Some(&passenger), "/assignedSeat")]),
            "seatPreference": first_present(&[at(Some(update), "/seatPreference"), at(Some(&passenger), "/seatPreference")]),
        });
        merge(&mut passenger, &compact(changes));
    }
    if let Some(fields) = passenger.as_object_mut() {
        fields.remove("passengerId");
        fields.remove("updateReason");
    }

    let pax = str_at(Some(&passenger), "/id")
        .map(|id| id.trim_start_matches("pax-").to_uppercase())
        .unwrap_or_else(|| "PAX001".to_string());
    let seat = str_at(Some(&passenger), "/assignedSeat").unwrap_or("12A").to_string();
    let mut defaults = json!({
        "checkInStatus": first_or(&[at(Some(&passenger), "/checkInStatus")], json!("CHECKED_IN")),
        "checkInTime": first_or(&[at(Some(&passenger), "/checkInTime")], json!("2025-12-14T10:00:00-08:00")),
    });
    let seat_changed = update.and_then(|u| str_at(Some(u), "/assignedSeat")).is_some()
        && previous_seat.as_deref() != Some(seat.as_str());
    match at(Some(&passenger), "/boardingPass") {
        None => merge(
            &mut defaults,
            &json!({
                "boardingPass": {
                    "url": format!("{}/boardingpass/{}-{}.pdf", DOCUMENTS_URL, pnr, pax),
                    "mimeType": "application/pdf",
                    "qrCode": format!("{}/boardingpass/qr/{}-{}.png", DOCUMENTS_URL, pnr, pax),
                    "barcode": barcode(&passenger, pnr, "SFOJFK 3551", &seat, "001D007B")
                }
            }),
        ),
        Some(existing) if seat_changed => {
            let mut pass = existing.clone();
            merge(&mut pass, &json!({ "barcode": barcode(&passenger, pnr, route, &seat, "001D014BB") }));
            merge(&mut defaults, &json!({ "boardingPass": pass }));
        }
        Some(_) => {}
    }
    merge(&mut passenger, &defaults);
    passenger
}

fn with_gate(airport: Option<&Value>, fallback: &str) -> Value {
    let mut airport = first_or(&[airport], json!({}));
    let gate = first_or(&[at(Some(&airport), "/gate")], json!(fallback));
    merge(&mut airport, &json!({ "gate": gate }));
    airport
}

fn tracking_action(pnr: &str) -> Value {
    json!({
        "@type": "schema:TrackAction",
        "schema:target": { "@type": "schema:EntryPoint", "schema:url": format!("https://delta.com/track/{}", pnr) }
    })
}

fn fare_descriptor() -> Value {
    json!({
        "@context": DRAFT_CORE_CONTEXT,
        "@type": "beckn:Descriptor",
        "schema:name": "Main Cabin Economy Fare",
        "beckn:shortDesc": "Standard economy fare with carry-on bag included"
    })
}

fn fare_price(currency: &str, fare: f64) -> Value {
    json!({
        "@context": DRAFT_CORE_CONTEXT,
        "@type": "schema:PriceSpecification",
        "schema:priceCurrency": currency,
        "schema:price": fare
    })
}

fn amount(currency: &str, total: f64) -> Value {
    json!({
        "@context": DRAFT_CORE_CONTEXT,
        "@type": "schema:PriceSpecification",
        "schema:priceCurrency": currency,
        "schema:price": round2(total)
    })
}

fn default_seller() -> Value {
    json!({ "@context": DRAFT_CORE_CONTEXT, "@type": "beckn:Provider", "beckn:id": SELLER_ID })
}

fn default_buyer() -> Value {
    json!({
        "@context": DRAFT_CORE_CONTEXT,
        "@type": "beckn:Buyer",
        "beckn:id": format!("buyer-{}", now_millis()),
        "beckn:role": "BUYER"
    })
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

/// Paid payment carried from the confirmed order
fn paid_payment(prior: Option<&Value>) -> Value {
    json!({
        "@context": DRAFT_CORE_CONTEXT,
        "@type": "beckn:Payment",
        "beckn:id": first_or(&[at(prior, "/beckn:payment/beckn:id")], json!(format!("payment-{}", now_millis()))),
        "beckn:status": "PAID",
        "beckn:amount": first_or(&[at(prior, "/beckn:payment/beckn:amount")], amount("USD", DEFAULT_TOTAL)),
        "beckn:txnRef": first_or(&[at(prior, "/beckn:payment/beckn:txnRef")], json!(format!("TXN-{}", now_millis()))),
        "beckn:beneficiary": "BPP",
        "beckn:acceptedPaymentMethod": first_or(&[at(prior, "/beckn:payment/beckn:acceptedPaymentMethod")], json!(["Card"]))
    })
}

fn cancellation_terms() -> Value {
    json!([
        {
            "condition": "More than 24 hours before departure",
            "cancellationFee": CANCELLATION_FEE,
            "refundEligible": true,
            "refundPercentage": 35
        },
        {
            "condition": "Less than 24 hours before departure",
            "cancellationFee": DEFAULT_FARE,
            "refundEligible": false
        }
    ])
}

fn confirmation_document(pnr: &str) -> Value {
    json!({
        "url": format!("{}/documents/booking-{}-confirmation.pdf", DOCUMENTS_URL, pnr.to_lowercase()),
        "mimeType": "application/pdf"
    })
}

fn e_ticket(pnr: &str) -> Value {
    json!({
        "url": format!("{}/documents/eticket-{}.pdf", DOCUMENTS_URL, pnr.to_lowercase()),
        "mimeType": "application/pdf"
    })
}

/// Booking attributes carried through status and update
fn booking_attributes(prior: Option<&Value>, pnr: &str) -> Value {
    let mut attributes = first_or(&[at(prior, "/beckn:orderAttributes")], json!({}));
    merge(
        &mut attributes,
        &json!({
            "@context": first_or(&[at(prior, "/beckn:orderAttributes/@context")], json!(FLIGHT_BOOKING_CONTEXT)),
            "@type": first_or(&[at(prior, "/beckn:orderAttributes/@type")], json!("FlightBooking")),
            "pnr": pnr,
            "bookingReference": first_or(
                &[at(prior, "/beckn:orderNumber"), at(prior, "/beckn:orderAttributes/bookingReference")],
                json!(format!("BK-{}", millis_suffix(6))),
            ),
            "confirmationDocument": first_or(&[at(prior, "/beckn:orderAttributes/confirmationDocument")], confirmation_document(pnr)),
            "eTicket": first_or(&[at(prior, "/beckn:orderAttributes/eTicket")], e_ticket(pnr)),
            "cancellationTerms": first_or(&[at(prior, "/beckn:orderAttributes/cancellationTerms")], cancellation_terms())
        }),
    );
    attributes
}
