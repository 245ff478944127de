//! Permission catalogue.
//!
//! Names follow `<action>:<resource>` and must match the `permissions` table.

macro_rules! crud_permissions {
    ($($create:ident, $read:ident, $update:ident, $delete:ident => $resource:literal;)*) => {
        $(
            pub const $create: &str = concat!("create:", $resource);
            pub const $read: &str = concat!("read:", $resource);
            pub const $update: &str = concat!("update:", $resource);
            pub const $delete: &str = concat!("delete:", $resource);
        )*

        /// Every permission known to the backend.
        pub const ALL: &[&str] = &[$($create, $read, $update, $delete,)*];
    };
}

crud_permissions! {
    CREATE_ACTIVITIES, READ_ACTIVITIES, UPDATE_ACTIVITIES, DELETE_ACTIVITIES => "activities";
    CREATE_ACTIVITY_LOCATION, READ_ACTIVITY_LOCATION, UPDATE_ACTIVITY_LOCATION, DELETE_ACTIVITY_LOCATION => "activity_location";
    CREATE_EVENTS, READ_EVENTS, UPDATE_EVENTS, DELETE_EVENTS => "events";
    CREATE_EVENT_TYPES, READ_EVENT_TYPES, UPDATE_EVENT_TYPES, DELETE_EVENT_TYPES => "event_types";
    CREATE_SUB_LOCATIONS, READ_SUB_LOCATIONS, UPDATE_SUB_LOCATIONS, DELETE_SUB_LOCATIONS => "sub_locations";
    CREATE_LOCATIONS, READ_LOCATIONS, UPDATE_LOCATIONS, DELETE_LOCATIONS => "locations";
    CREATE_TARGET_GROUPS, READ_TARGET_GROUPS, UPDATE_TARGET_GROUPS, DELETE_TARGET_GROUPS => "target_groups";
    CREATE_GROUPS, READ_GROUPS, UPDATE_GROUPS, DELETE_GROUPS => "groups";
    CREATE_USER_ACTIVITY, READ_USER_ACTIVITY, UPDATE_USER_ACTIVITY, DELETE_USER_ACTIVITY => "user_activity";
    CREATE_USERS, READ_USERS, UPDATE_USERS, DELETE_USERS => "users";
    CREATE_USER_GROUP, READ_USER_GROUP, UPDATE_USER_GROUP, DELETE_USER_GROUP => "user_group";
    CREATE_USER_PERMISSIONS, READ_USER_PERMISSIONS, UPDATE_USER_PERMISSIONS, DELETE_USER_PERMISSIONS => "user_permissions";
    CREATE_USER_ROLE, READ_USER_ROLE, UPDATE_USER_ROLE, DELETE_USER_ROLE => "user_role";
    CREATE_PERMISSIONS, READ_PERMISSIONS, UPDATE_PERMISSIONS, DELETE_PERMISSIONS => "permissions";
    CREATE_ROLES, READ_ROLES, UPDATE_ROLES, DELETE_ROLES => "roles";
    CREATE_ROLE_PERMISSIONS, READ_ROLE_PERMISSIONS, UPDATE_ROLE_PERMISSIONS, DELETE_ROLE_PERMISSIONS => "role_permissions";
    CREATE_HOUR_TYPES, READ_HOUR_TYPES, UPDATE_HOUR_TYPES, DELETE_HOUR_TYPES => "hour_types";
    CREATE_JOIN_TYPES, READ_JOIN_TYPES, UPDATE_JOIN_TYPES, DELETE_JOIN_TYPES => "join_types";
}

/// Role allowed to perform cache administration.
pub const ADMIN_ROLE: &str = "admin";
