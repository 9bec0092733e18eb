diesel::table! {
    users (id) {
        id -> Uuid,
        #[max_length = 255]
        name -> Varchar,
        #[max_length = 255]
        email -> Varchar,
        #[max_length = 16]
        role -> Varchar,
        photo_url -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    jobs (id) {
        id -> Uuid,
        #[max_length = 255]
        title -> Varchar,
        #[max_length = 100]
        category -> Varchar,
        description -> Nullable<Text>,
        data -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    applications (id) {
        id -> Uuid,
        #[max_length = 255]
        email -> Varchar,
        job_id -> Text,
        data -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    favorite_jobs (id) {
        id -> Uuid,
        #[max_length = 255]
        email -> Varchar,
        job_id -> Text,
        data -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    messages (id) {
        id -> Uuid,
        text -> Text,
        #[max_length = 255]
        applier_email -> Varchar,
        #[max_length = 255]
        sender_email -> Varchar,
        #[max_length = 255]
        sender -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    applications,
    favorite_jobs,
    jobs,
    messages,
    users,
);
