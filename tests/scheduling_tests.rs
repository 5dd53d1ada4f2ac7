mod common;

use chrono::{NaiveDate, NaiveTime};
use common::{RecordingMailer, TestDb};
use odonto::{
    Error,
    models::users::{RequestContext, Role},
    services::scheduling::{
        add_availability, book_appointment, book_for_patient, cancel_appointment, dentist_events,
        list_appointments, list_free_slots, patient_events, patient_slot_events,
        remove_availability, schedule_for_patient,
    },
};
use uuid::Uuid;

fn june_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

#[tokio::test]
async fn test_duplicate_availability_is_rejected() {
    let test_db = TestDb::new("test_duplicate_availability_is_rejected").await;
    let dentist = test_db.create_dentist("dentist").await;
    let mut conn = test_db.get_connection().await;

    add_availability(&mut conn, dentist.id, june_first(), at(9, 0))
        .await
        .expect("First availability should be created");

    let result = add_availability(&mut conn, dentist.id, june_first(), at(9, 0)).await;
    assert!(
        matches!(result, Err(Error::DuplicateSlot)),
        "Second availability for the same slot should be DuplicateSlot, got {:?}",
        result
    );
}

#[tokio::test]
async fn test_second_booking_of_slot_is_occupied() {
    let test_db = TestDb::new("test_second_booking_of_slot_is_occupied").await;
    let dentist = test_db.create_dentist("dentist").await;
    let first = test_db.create_patient("first", dentist.id).await;
    let second = test_db.create_patient("second", dentist.id).await;
    let mut conn = test_db.get_connection().await;

    // No availability row is needed to book.
    book_appointment(&mut conn, first.id, dentist.id, june_first(), at(10, 0))
        .await
        .expect("First booking should succeed");

    let result = book_appointment(&mut conn, second.id, dentist.id, june_first(), at(10, 0)).await;
    assert!(matches!(result, Err(Error::SlotOccupied)), "Got {:?}", result);

    let count = test_db.appointments_at(dentist.id, june_first(), at(10, 0)).await;
    assert_eq!(count, 1, "Exactly one appointment should occupy the slot");
}

#[tokio::test]
async fn test_slot_seconds_do_not_create_distinct_slots() {
    let test_db = TestDb::new("test_slot_seconds_do_not_create_distinct_slots").await;
    let dentist = test_db.create_dentist("dentist").await;
    let first = test_db.create_patient("first", dentist.id).await;
    let second = test_db.create_patient("second", dentist.id).await;
    let mut conn = test_db.get_connection().await;
    let with_seconds = NaiveTime::from_hms_opt(9, 0, 30).unwrap();

    let availability = add_availability(&mut conn, dentist.id, june_first(), with_seconds)
        .await
        .unwrap();
    assert_eq!(availability.time, at(9, 0));

    let result = add_availability(&mut conn, dentist.id, june_first(), at(9, 0)).await;
    assert!(matches!(result, Err(Error::DuplicateSlot)), "Got {:?}", result);

    book_appointment(&mut conn, first.id, dentist.id, june_first(), at(9, 0))
        .await
        .expect("Booking 09:00 should succeed");
    assert!(
        list_free_slots(&mut conn, dentist.id).await.unwrap().is_empty(),
        "The 09:00:30 availability is the 09:00 slot"
    );

    let result = book_appointment(&mut conn, second.id, dentist.id, june_first(), with_seconds).await;
    assert!(matches!(result, Err(Error::SlotOccupied)), "Got {:?}", result);

    let count = test_db.appointments_at(dentist.id, june_first(), at(9, 0)).await;
    assert_eq!(count, 1);
    assert_eq!(test_db.appointments_at(dentist.id, june_first(), with_seconds).await, 0);
}

#[tokio::test]
async fn test_concurrent_bookings_have_single_winner() {
    let test_db = TestDb::new("test_concurrent_bookings_have_single_winner").await;
    let dentist = test_db.create_dentist("dentist").await;
    let a = test_db.create_patient("a", dentist.id).await;
    let b = test_db.create_patient("b", dentist.id).await;

    let mut conn_a = test_db.get_connection().await;
    let mut conn_b = test_db.get_connection().await;

    let (result_a, result_b) = tokio::join!(
        book_appointment(&mut conn_a, a.id, dentist.id, june_first(), at(11, 0)),
        book_appointment(&mut conn_b, b.id, dentist.id, june_first(), at(11, 0)),
    );

    let successes = [result_a.is_ok(), result_b.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(successes, 1, "Exactly one concurrent booking should win");

    let loser = if result_a.is_ok() { result_b } else { result_a };
    assert!(matches!(loser, Err(Error::SlotOccupied)), "Got {:?}", loser);

    let count = test_db.appointments_at(dentist.id, june_first(), at(11, 0)).await;
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_many_concurrent_bookings_write_one_row() {
    let test_db = TestDb::new("test_many_concurrent_bookings_write_one_row").await;
    let dentist = test_db.create_dentist("dentist").await;

    let mut patients = Vec::new();
    for i in 0..5 {
        patients.push(test_db.create_patient(&format!("p{}", i), dentist.id).await);
    }

    let mut handles = Vec::new();
    for patient in &patients {
        let pool = test_db.pool.clone();
        let (patient_id, dentist_id) = (patient.id, dentist.id);
        handles.push(tokio::spawn(async move {
            let mut conn = pool.acquire().await.unwrap();
            book_appointment(&mut conn, patient_id, dentist_id, june_first(), at(15, 30)).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(Error::SlotOccupied) => {}
            Err(e) => panic!("Unexpected booking error: {:?}", e),
        }
    }
    assert_eq!(successes, 1);

    let count = test_db.appointments_at(dentist.id, june_first(), at(15, 30)).await;
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_remove_availability_is_idempotent() {
    let test_db = TestDb::new("test_remove_availability_is_idempotent").await;
    let dentist = test_db.create_dentist("dentist").await;
    let other = test_db.create_dentist("other").await;
    let mut conn = test_db.get_connection().await;

    // Unknown id
    remove_availability(&mut conn, Uuid::now_v7(), dentist.id)
        .await
        .expect("Removing an unknown availability should be a no-op");

    // Foreign id: silently ignored and left in place
    let availability = add_availability(&mut conn, dentist.id, june_first(), at(9, 0))
        .await
        .unwrap();
    remove_availability(&mut conn, availability.id, other.id)
        .await
        .expect("Removing a foreign availability should be a no-op");
    assert_eq!(list_free_slots(&mut conn, dentist.id).await.unwrap().len(), 1);

    // Owner removes it, twice
    remove_availability(&mut conn, availability.id, dentist.id).await.unwrap();
    remove_availability(&mut conn, availability.id, dentist.id).await.unwrap();
    assert!(list_free_slots(&mut conn, dentist.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_foreign_cancel_leaves_appointment() {
    let test_db = TestDb::new("test_foreign_cancel_leaves_appointment").await;
    let dentist = test_db.create_dentist("dentist").await;
    let other_dentist = test_db.create_dentist("other_dentist").await;
    let owner = test_db.create_patient("owner", dentist.id).await;
    let stranger = test_db.create_patient("stranger", dentist.id).await;
    let mut conn = test_db.get_connection().await;

    let appointment = book_appointment(&mut conn, owner.id, dentist.id, june_first(), at(9, 0))
        .await
        .unwrap();

    let by_stranger = RequestContext::new(stranger.id, Role::Patient);
    let result = cancel_appointment(&mut conn, appointment.id, &by_stranger).await;
    assert!(matches!(result, Err(Error::NotFoundOrForbidden(_))), "Got {:?}", result);

    let by_other_dentist = RequestContext::new(other_dentist.id, Role::Dentist);
    let result = cancel_appointment(&mut conn, appointment.id, &by_other_dentist).await;
    assert!(matches!(result, Err(Error::NotFoundOrForbidden(_))), "Got {:?}", result);

    let still_there = test_db.find_appointment(appointment.id).await;
    assert!(still_there.is_some(), "Appointment must survive foreign cancellations");

    // The appointment's dentist may cancel it.
    let by_dentist = RequestContext::new(dentist.id, Role::Dentist);
    cancel_appointment(&mut conn, appointment.id, &by_dentist).await.unwrap();
    assert!(test_db.find_appointment(appointment.id).await.is_none());

    // Cancelling again finds nothing.
    let result = cancel_appointment(&mut conn, appointment.id, &by_dentist).await;
    assert!(matches!(result, Err(Error::NotFoundOrForbidden(_))));
}

#[tokio::test]
async fn test_booking_scenario_from_availability_to_cancellation() {
    let test_db = TestDb::new("test_booking_scenario_from_availability_to_cancellation").await;
    let dentist = test_db.create_dentist("dentist").await;
    let patient = test_db.create_patient("patient", dentist.id).await;
    let mut conn = test_db.get_connection().await;

    // Dentist opens 2024-06-01 09:00
    let availability = add_availability(&mut conn, dentist.id, june_first(), at(9, 0))
        .await
        .unwrap();

    let free = list_free_slots(&mut conn, dentist.id).await.unwrap();
    assert_eq!(free.len(), 1);
    assert_eq!(free[0].id, availability.id);

    // Patient books it
    let appointment = book_appointment(&mut conn, patient.id, dentist.id, june_first(), at(9, 0))
        .await
        .unwrap();
    assert!(list_free_slots(&mut conn, dentist.id).await.unwrap().is_empty());

    let dentist_view = list_appointments(&mut conn, dentist.id, Role::Dentist).await.unwrap();
    assert_eq!(dentist_view.len(), 1);
    assert_eq!(dentist_view[0].id, appointment.id);
    assert_eq!(dentist_view[0].counterpart_name, patient.name);

    let patient_view = list_appointments(&mut conn, patient.id, Role::Patient).await.unwrap();
    assert_eq!(patient_view.len(), 1);
    assert_eq!(patient_view[0].counterpart_name, dentist.name);

    // Patient cancels; the slot is free again
    let ctx = RequestContext::new(patient.id, Role::Patient);
    cancel_appointment(&mut conn, appointment.id, &ctx).await.unwrap();

    assert!(list_appointments(&mut conn, dentist.id, Role::Dentist).await.unwrap().is_empty());
    let free = list_free_slots(&mut conn, dentist.id).await.unwrap();
    assert_eq!(free.len(), 1);
    assert_eq!(free[0].id, availability.id);
}

#[tokio::test]
async fn test_free_slots_are_ordered() {
    let test_db = TestDb::new("test_free_slots_are_ordered").await;
    let dentist = test_db.create_dentist("dentist").await;
    let mut conn = test_db.get_connection().await;

    let june_second = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
    add_availability(&mut conn, dentist.id, june_second, at(8, 0)).await.unwrap();
    add_availability(&mut conn, dentist.id, june_first(), at(14, 0)).await.unwrap();
    add_availability(&mut conn, dentist.id, june_first(), at(9, 30)).await.unwrap();

    let slots: Vec<_> = list_free_slots(&mut conn, dentist.id)
        .await
        .unwrap()
        .into_iter()
        .map(|slot| (slot.date, slot.time))
        .collect();

    assert_eq!(
        slots,
        vec![
            (june_first(), at(9, 30)),
            (june_first(), at(14, 0)),
            (june_second, at(8, 0)),
        ]
    );
}

#[tokio::test]
async fn test_patient_self_booking_notifies_dentist() {
    let test_db = TestDb::new("test_patient_self_booking_notifies_dentist").await;
    let dentist = test_db.create_dentist("dentist").await;
    let patient = test_db.create_patient("patient", dentist.id).await;
    let mailer = RecordingMailer::default();
    let mut conn = test_db.get_connection().await;

    add_availability(&mut conn, dentist.id, june_first(), at(9, 0)).await.unwrap();

    let ctx = RequestContext::new(patient.id, Role::Patient);
    let slots = patient_slot_events(&mut conn, &ctx).await.unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].title, "Livre");
    assert_eq!(slots[0].start, "2024-06-01T09:00:00");

    let appointment = book_for_patient(&mut conn, &mailer, &ctx, june_first(), at(9, 0))
        .await
        .unwrap();
    assert_eq!(appointment.dentist_id, dentist.id);

    let sent = mailer.messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, dentist.email);

    let result = book_for_patient(&mut conn, &mailer, &ctx, june_first(), at(9, 0)).await;
    assert!(matches!(result, Err(Error::SlotOccupied)));
    assert_eq!(mailer.messages().len(), 1, "Failed bookings send no email");

    assert!(patient_slot_events(&mut conn, &ctx).await.unwrap().is_empty());

    let events = patient_events(&mut conn, patient.id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, format!("Consulta - {}", dentist.name));
}

#[tokio::test]
async fn test_dentist_schedules_only_visible_patients() {
    let test_db = TestDb::new("test_dentist_schedules_only_visible_patients").await;
    let dentist = test_db.create_dentist("dentist").await;
    let other_dentist = test_db.create_dentist("other").await;
    let own_patient = test_db.create_patient("own", dentist.id).await;
    let foreign_patient = test_db.create_patient("foreign", other_dentist.id).await;
    let mailer = RecordingMailer::default();
    let mut conn = test_db.get_connection().await;

    let ctx = RequestContext::new(dentist.id, Role::Dentist);

    let result =
        schedule_for_patient(&mut conn, &mailer, &ctx, foreign_patient.id, june_first(), at(9, 0)).await;
    assert!(matches!(result, Err(Error::NotFoundOrForbidden(_))), "Got {:?}", result);

    let appointment =
        schedule_for_patient(&mut conn, &mailer, &ctx, own_patient.id, june_first(), at(9, 0))
            .await
            .unwrap();
    assert_eq!(appointment.dentist_id, dentist.id);
    assert_eq!(appointment.patient_id, own_patient.id);

    let sent = mailer.messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, own_patient.email);

    let events = dentist_events(&mut conn, dentist.id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, format!("ap{}", appointment.id));
    assert_eq!(events[0].title, format!("Agendado: {}", own_patient.name));
}
