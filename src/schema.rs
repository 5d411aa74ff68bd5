diesel::table! {
    accounts (id) {
        id -> Uuid,
        email -> Text,
        name -> Text,
        password_hash -> Text,
        is_volunteer -> Bool,
    }
}

diesel::table! {
    timeslots (id) {
        id -> Uuid,
        volunteer_id -> Uuid,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        subject -> Text,
        is_available -> Bool,
    }
}

diesel::table! {
    bookings (id) {
        id -> Uuid,
        student_id -> Uuid,
        slot_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(timeslots -> accounts (volunteer_id));
diesel::joinable!(bookings -> timeslots (slot_id));

diesel::allow_tables_to_appear_in_same_query!(accounts, timeslots, bookings);
