//! Narrative summary paragraph printed under the owner's name on page one.

use crate::record::InspectionRecord;

/// Build the summary paragraph for a record. Missing fields read as `N/A`.
pub fn build_summary(record: &InspectionRecord) -> String {
    let owner = record.value_or_default("ECD Owner Name");
    let business = record.value_or_default("Name of ECD Business");
    let opened = record.value_or_default("Year ECD Opened");
    let children = record.value_or_default("Number of Children");
    let classrooms = record.value_or_default("Number of Classrooms");
    let ablution = record.value_or_default("Ablution Facility");
    let potties = record.value_or_default("Number of Potties");

    format!(
        "{owner} is the owner of {business} located in the Greater Giyani Local. \
         {business} was opened in {opened} and has {children} children in {classrooms} classroom(s). \
         The ECD has {ablution}, and {potties} pottie(s). \
         {business} is not registered with the DBE and does not receive a state subsidy. \
         The owner owns the land and has permission to occupy the space, and the ECD property is used for the ecd only."
    )
}
