use shared_models::auth::Role;

use crate::models::{NavigationEntry, NavigationSection};

const CLINICAL: &[Role] = &[Role::Admin, Role::Doctor, Role::Nurse, Role::Staff];

static ENTRIES: [NavigationEntry; 8] = [
    NavigationEntry {
        name: "Dashboard",
        path: "/dashboard",
        icon: "home",
        roles: CLINICAL,
    },
    NavigationEntry {
        name: "Patients",
        path: "/patients",
        icon: "users",
        roles: CLINICAL,
    },
    NavigationEntry {
        name: "Appointments",
        path: "/appointments",
        icon: "calendar",
        roles: CLINICAL,
    },
    NavigationEntry {
        name: "Medical records",
        path: "/medical-records",
        icon: "folder",
        roles: &[Role::Admin, Role::Doctor, Role::Nurse],
    },
    NavigationEntry {
        name: "Prescriptions",
        path: "/prescriptions",
        icon: "clipboard",
        roles: &[Role::Admin, Role::Doctor],
    },
    NavigationEntry {
        name: "Billing",
        path: "/billing",
        icon: "credit-card",
        roles: &[Role::Admin, Role::Staff],
    },
    NavigationEntry {
        name: "Users",
        path: "/users",
        icon: "user-cog",
        roles: &[Role::Admin],
    },
    NavigationEntry {
        name: "Settings",
        path: "/settings",
        icon: "settings",
        roles: CLINICAL,
    },
];

const SECTIONS: [(&str, &[&str]); 3] = [
    ("Main", &["/dashboard", "/patients", "/appointments"]),
    ("Management", &["/medical-records", "/prescriptions", "/billing"]),
    ("Administration", &["/users", "/settings"]),
];

/// Entries visible to `role`, in declaration order. Unknown roles see nothing.
pub fn filter_navigation(role: Option<Role>) -> Vec<&'static NavigationEntry> {
    let Some(role) = role else {
        return Vec::new();
    };
    ENTRIES.iter().filter(|entry| entry.visible_to(role)).collect()
}

/// Visible entries grouped into sections; sections left empty are dropped.
pub fn navigation_for(role: Option<Role>) -> Vec<NavigationSection> {
    let visible = filter_navigation(role);

    SECTIONS
        .iter()
        .filter_map(|(title, paths)| {
            let items: Vec<&'static NavigationEntry> = visible
                .iter()
                .copied()
                .filter(|entry| paths.contains(&entry.path))
                .collect();
            (!items.is_empty()).then_some(NavigationSection {
                title: *title,
                items,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(role: Option<Role>) -> Vec<&'static str> {
        filter_navigation(role).into_iter().map(|e| e.path).collect()
    }

    #[test]
    fn admin_sees_everything() {
        assert_eq!(paths(Some(Role::Admin)).len(), ENTRIES.len());
    }

    #[test]
    fn nurse_navigation() {
        assert_eq!(
            paths(Some(Role::Nurse)),
            [
                "/dashboard",
                "/patients",
                "/appointments",
                "/medical-records",
                "/settings"
            ]
        );
    }

    #[test]
    fn staff_sees_billing_but_not_records() {
        let staff = paths(Some(Role::Staff));
        assert!(staff.contains(&"/billing"));
        assert!(!staff.contains(&"/medical-records"));
        assert!(!staff.contains(&"/users"));
    }

    #[test]
    fn patient_and_unknown_get_empty_menu() {
        assert!(filter_navigation(Some(Role::Patient)).is_empty());
        assert!(navigation_for(None).is_empty());
    }

    #[test]
    fn sections_keep_order_and_drop_empty() {
        let sections = navigation_for(Some(Role::Doctor));
        let titles: Vec<&str> = sections.iter().map(|s| s.title).collect();
        assert_eq!(titles, ["Main", "Management", "Administration"]);
        assert_eq!(sections[1].items.len(), 2);
        assert_eq!(sections[2].items[0].path, "/settings");
    }
}
