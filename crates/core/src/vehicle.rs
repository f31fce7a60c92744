//! Vehicle operating status.

use crate::lookup::define_lookup_enum;

define_lookup_enum! {
    /// Vehicle operating status (`vehicle_statuses`).
    VehicleStatus ("VehicleStatus") {
        /// Operative and available for service.
        Active = 1 => "active",
        /// Held at the workshop while a work order is in progress.
        InShop = 2 => "in_shop",
        OutOfService = 3 => "out_of_service",
    }
}
