// Database schema for the alumni network
diesel::table! {
    users (uid) {
        uid -> Text,
        email -> Text,
        first_name -> Text,
        last_name -> Text,
        address -> Nullable<Text>,
        province -> Nullable<Text>,
        school_department -> Nullable<Text>,
        course -> Nullable<Text>,
        student_id -> Nullable<Text>,
        year_graduated -> Nullable<Text>,
        phone -> Nullable<Text>,
        photo_data_url -> Nullable<Text>,
        summary -> Nullable<Text>,
        role -> Text,                // alumni, dept_head, alumni_association_admin, super_admin
        status -> Text,              // pending, approved, rejected
        is_locked -> Bool,
        digital_id_status -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    profile_items (user_id, kind, id) {
        user_id -> Text,
        kind -> Text,                // experience, skill, accomplishment
        id -> Text,
        payload -> Text,             // JSON body of the entry
        position -> BigInt,          // insertion order
    }
}

diesel::table! {
    connections (user_id, other_id) {
        user_id -> Text,
        other_id -> Text,
    }
}

diesel::table! {
    posts (id) {
        id -> Text,
        user_id -> Text,
        user_name -> Text,
        user_avatar -> Text,
        text -> Text,
        image -> Text,
        visibility -> Text,          // public, friends, onlyme
        timestamp -> BigInt,         // ms since epoch
    }
}

diesel::table! {
    post_likes (post_id, user_id) {
        post_id -> Text,
        user_id -> Text,
    }
}

diesel::table! {
    post_comments (id) {
        id -> Text,
        post_id -> Text,
        user_id -> Text,
        user_name -> Text,
        text -> Text,
        timestamp -> BigInt,
    }
}

diesel::table! {
    events (id) {
        id -> Text,
        title -> Text,
        description -> Text,
        date -> Date,
        location -> Text,
        capacity -> Nullable<Integer>,
        department -> Nullable<Text>, // NULL for global events
        created_by -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    event_attendees (event_id, user_id) {
        event_id -> Text,
        user_id -> Text,
    }
}

diesel::table! {
    announcements (id) {
        id -> Text,
        title -> Text,
        content -> Text,
        kind -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    notifications (id) {
        id -> Text,
        user_id -> Text,
        kind -> Text,
        title -> Text,
        message -> Text,
        data -> Nullable<Text>,      // JSON
        read -> Bool,
        timestamp -> BigInt,
        created_at -> Timestamp,
    }
}

diesel::table! {
    id_requests (user_id) {
        user_id -> Text,
        status -> Text,
        details -> Text,             // JSON
        requested_at -> Timestamp,
        decided_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    courses (id) {
        id -> Text,
        name -> Text,
        dept_name -> Text,
    }
}

diesel::table! {
    credentials (email) {
        email -> Text,
        uid -> Text,
        password_hash -> Text,       // argon2id PHC string
        display_name -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    sessions (token) {
        token -> Text,
        uid -> Text,
        created_at -> Timestamp,
        expires_at -> Timestamp,
    }
}

diesel::joinable!(post_likes -> posts (post_id));
diesel::joinable!(post_comments -> posts (post_id));
diesel::joinable!(event_attendees -> events (event_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    profile_items,
    connections,
    posts,
    post_likes,
    post_comments,
    events,
    event_attendees,
    announcements,
    notifications,
    id_requests,
    courses,
    credentials,
    sessions,
);

/// DDL applied on startup. Every statement is idempotent.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    uid TEXT PRIMARY KEY NOT NULL,
    email TEXT NOT NULL UNIQUE,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    address TEXT,
    province TEXT,
    school_department TEXT,
    course TEXT,
    student_id TEXT,
    year_graduated TEXT,
    phone TEXT,
    photo_data_url TEXT,
    summary TEXT,
    role TEXT NOT NULL,
    status TEXT NOT NULL,
    is_locked BOOLEAN NOT NULL DEFAULT 0,
    digital_id_status TEXT,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_users_status ON users (status);
CREATE INDEX IF NOT EXISTS idx_users_department ON users (school_department);

CREATE TABLE IF NOT EXISTS profile_items (
    user_id TEXT NOT NULL REFERENCES users (uid) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    id TEXT NOT NULL,
    payload TEXT NOT NULL,
    position BIGINT NOT NULL,
    PRIMARY KEY (user_id, kind, id)
);

CREATE TABLE IF NOT EXISTS connections (
    user_id TEXT NOT NULL REFERENCES users (uid) ON DELETE CASCADE,
    other_id TEXT NOT NULL REFERENCES users (uid) ON DELETE CASCADE,
    PRIMARY KEY (user_id, other_id)
);

CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL,
    user_name TEXT NOT NULL,
    user_avatar TEXT NOT NULL,
    text TEXT NOT NULL,
    image TEXT NOT NULL,
    visibility TEXT NOT NULL,
    timestamp BIGINT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_posts_timestamp ON posts (timestamp);

CREATE TABLE IF NOT EXISTS post_likes (
    post_id TEXT NOT NULL REFERENCES posts (id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    PRIMARY KEY (post_id, user_id)
);

CREATE TABLE IF NOT EXISTS post_comments (
    id TEXT PRIMARY KEY NOT NULL,
    post_id TEXT NOT NULL REFERENCES posts (id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    user_name TEXT NOT NULL,
    text TEXT NOT NULL,
    timestamp BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    date DATE NOT NULL,
    location TEXT NOT NULL,
    capacity INTEGER,
    department TEXT,
    created_by TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS event_attendees (
    event_id TEXT NOT NULL REFERENCES events (id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    PRIMARY KEY (event_id, user_id)
);

CREATE TABLE IF NOT EXISTS announcements (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    kind TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    data TEXT,
    read BOOLEAN NOT NULL DEFAULT 0,
    timestamp BIGINT NOT NULL,
    created_at TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications (user_id);

CREATE TABLE IF NOT EXISTS id_requests (
    user_id TEXT PRIMARY KEY NOT NULL,
    status TEXT NOT NULL,
    details TEXT NOT NULL,
    requested_at TIMESTAMP NOT NULL,
    decided_at TIMESTAMP
);

CREATE TABLE IF NOT EXISTS courses (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    dept_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS credentials (
    email TEXT PRIMARY KEY NOT NULL,
    uid TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    display_name TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY NOT NULL,
    uid TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL,
    expires_at TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions (expires_at);
"#;
