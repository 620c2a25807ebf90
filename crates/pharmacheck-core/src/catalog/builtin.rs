//! Built-in endpoint table for the pharmacy and billing API

use serde_json::json;

use super::{EndpointDef, QueryParam};
use crate::adapter::Extraction;
use crate::expectation::{ExpectationSpec, NestedFields};
use crate::template::Params;

const FROM_DATE: &str = "2020-01-01";
const TO_DATE: &str = "2024-11-19";
const INVOICE_TO_DATE: &str = "2024-11-21";

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}

fn endpoint(key: &str, path: &str, extract: Extraction) -> EndpointDef {
    EndpointDef {
        key: key.to_string(),
        description: None,
        path: path.to_string(),
        query: Vec::new(),
        params: Params::new(),
        extract,
        expect: ExpectationSpec {
            status_code: Some(200),
            status: Some("OK".to_string()),
            ..Default::default()
        },
    }
}

fn columns(node: &str, fields: &[&str]) -> Extraction {
    Extraction::ListColumns {
        node: node.to_string(),
        fields: strings(fields),
    }
}

fn triple(node: &str, [a, b, c]: [&str; 3]) -> Extraction {
    Extraction::ScalarTriple {
        node: node.to_string(),
        fields: [a.to_string(), b.to_string(), c.to_string()],
    }
}

fn pair(node: &str, [a, b]: [&str; 2]) -> Extraction {
    Extraction::ScalarPair {
        node: node.to_string(),
        fields: [a.to_string(), b.to_string()],
    }
}

impl EndpointDef {
    fn describe(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    /// Query parameter whose value is the placeholder of the same name, with a default.
    fn param(mut self, name: &str, default: &str) -> Self {
        self.query.push(QueryParam {
            name: name.to_string(),
            value: format!("{{{name}}}"),
        });
        self.params.insert(name.to_string(), default.to_string());
        self
    }

    /// Query parameter bound to a differently-named placeholder.
    fn param_as(mut self, name: &str, placeholder: &str, default: &str) -> Self {
        self.query.push(QueryParam {
            name: name.to_string(),
            value: format!("{{{placeholder}}}"),
        });
        self.params.insert(placeholder.to_string(), default.to_string());
        self
    }

    /// Fixed query parameter.
    fn fixed(mut self, name: &str, value: &str) -> Self {
        self.query.push(QueryParam {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    fn date_range(self, to: &str) -> Self {
        self.param_as("FromDate", "fromDate", FROM_DATE)
            .param_as("ToDate", "toDate", to)
    }

    fn required(mut self, fields: &[&str]) -> Self {
        self.expect.required_fields = strings(fields);
        self
    }

    fn nested(mut self, node: &str, fields: &[&str]) -> Self {
        self.expect.nested_fields.push(NestedFields {
            node: node.to_string(),
            fields: strings(fields),
        });
        self
    }

    fn non_null(mut self, fields: &[&str]) -> Self {
        self.expect.non_null = strings(fields);
        self
    }

    /// Every extracted field must be non-null.
    fn all_non_null(mut self) -> Self {
        self.expect.non_null = self.extract.fields().to_vec();
        self
    }

    fn must_be_null(mut self, fields: &[&str]) -> Self {
        self.expect.must_be_null = strings(fields);
        self
    }

    fn unique(mut self, fields: &[&str]) -> Self {
        self.expect.unique = strings(fields);
        self
    }

    /// The field must echo the request parameter of the same kind.
    fn echoes(mut self, field: &str, placeholder: &str) -> Self {
        self.expect
            .equals
            .insert(field.to_string(), json!(format!("{{{placeholder}}}")));
        self
    }
}

pub(super) fn endpoints() -> Vec<EndpointDef> {
    vec![
        endpoint(
            "getAllStocks",
            "/PharmacyStock/AllStockDetails",
            columns("Results", &["ItemId", "ItemName", "GenericName"]),
        )
        .describe("Stock details for every pharmacy item")
        .required(&["ItemId", "ItemName", "GenericName", "SalePrice", "CostPrice"])
        .all_non_null(),
        endpoint(
            "getMainStore",
            "/PharmacySettings/MainStore",
            triple("Results", ["StoreId", "Category", "IsActive"]),
        )
        .describe("Main store settings")
        .all_non_null(),
        endpoint(
            "getRequisitionByDateRange",
            "/DispensaryRequisition/Dispensary/1",
            columns(
                "Results.requisitionList",
                &["RequistionNo", "RequisitionStatus", "RequisitionId"],
            ),
        )
        .describe("Dispensary requisitions in a date range")
        .date_range(TO_DATE)
        .all_non_null()
        .unique(&["RequisitionId"]),
        endpoint(
            "getPatientConsumptions",
            "/PatientConsumption/PatientConsumptions",
            columns("Results", &["PatientId", "HospitalNo", "PatientVisitId"]),
        )
        .describe("All patient consumptions")
        .all_non_null(),
        endpoint(
            "getPatientConsumptionInfoByPatientIdAndVisitId",
            "/PatientConsumption/PatientConsumptionInfo",
            triple(
                "Results.PatientConsumption",
                ["PatientName", "HospitalNo", "StoreId"],
            ),
        )
        .describe("Consumption header and items for one patient visit")
        .param_as("PatientId", "patientId", "114")
        .param("patientVisitId", "53")
        .required(&["PatientId", "PatientName", "HospitalNo", "StoreId"])
        .nested(
            "Results.PatientConsumptionItems",
            &[
                "PatientConsumptionItemId",
                "ItemId",
                "ItemName",
                "Quantity",
                "SalePrice",
                "TotalAmount",
                "BatchNo",
                "ExpiryDate",
                "StoreId",
            ],
        )
        .all_non_null(),
        endpoint(
            "getBillingSchemeBySchemeId",
            "/PatientConsumption/PharmacyIpBillingScheme",
            triple("Results", ["SchemeCode", "SchemeName", "SchemeId"]),
        )
        .describe("Inpatient billing scheme by id")
        .param("schemeId", "4")
        .all_non_null()
        .echoes("SchemeId", "schemeId"),
        endpoint(
            "getBillingSummaryByPatientId",
            "/PharmacySales/PatientBillingSummary",
            pair("Results", ["PatientId", "TotalDue"]),
        )
        .describe("Pharmacy billing summary for one patient")
        .param("patientId", "114")
        .all_non_null()
        .echoes("PatientId", "patientId"),
        endpoint(
            "getConsumptionsListOfAPatientById",
            "/PatientConsumption/ConsumptionsOfPatient",
            columns(
                "Results",
                &["PatientConsumptionId", "ConsumptionReceiptNo", "TotalAmount"],
            ),
        )
        .describe("Consumptions of one patient visit")
        .param("patientId", "114")
        .param("patientVisitId", "53")
        .all_non_null()
        .unique(&["PatientConsumptionId"]),
        endpoint(
            "getReturnConsumptionsList",
            "/PatientConsumption/Returns",
            columns(
                "Results",
                &["ConsumptionReturnReceiptNo", "HospitalNo", "PatientId"],
            ),
        )
        .describe("Returned consumptions")
        .all_non_null()
        .unique(&["ConsumptionReturnReceiptNo"]),
        endpoint(
            "getDischargedPatients",
            "/Admission/DischargedPatients",
            columns("Results", &["VisitCode", "PatientVisitId", "PatientId"]),
        )
        .describe("Patients discharged in a date range")
        .fixed("admissionStatus", "discharged")
        .date_range(TO_DATE)
        .all_non_null()
        .unique(&["PatientVisitId", "PatientId"]),
        endpoint(
            "getAdmittedPatients",
            "/IpBilling/AdmittedPatients",
            columns("Results", &["PatientId", "VisitId", "DischargeDate"]),
        )
        .describe("Currently admitted patients")
        .fixed("admissionStatus", "admitted")
        .date_range(TO_DATE)
        .non_null(&["PatientId", "VisitId"])
        .must_be_null(&["DischargeDate"])
        .unique(&["PatientId", "VisitId"]),
        endpoint(
            "searchIpdPatientByPatientId",
            "/Patient/IPDPatientSearch",
            columns("Results", &["PatientId", "PatientCode"]),
        )
        .describe("Inpatient search by name")
        .param_as("search", "patientName", "Devid8 Roy8")
        .all_non_null()
        .unique(&["PatientId", "PatientCode"]),
        endpoint(
            "getPatientProvisionalInfo",
            "/Billing/PatientsProvisionalInfo",
            columns("Results", &["PatientId", "PatientCode"]),
        )
        .describe("Patients with provisional bills")
        .all_non_null()
        .unique(&["PatientId", "PatientCode"]),
        endpoint(
            "getProvisionalItemsListByPatientIdAndSchemeId",
            "/Billing/ProvisionalItemsByPatientId",
            Extraction::NestedList {
                node: "Results.ProvisionalItems".to_string(),
            },
        )
        .describe("Provisional bill items for one patient and scheme")
        .param("patientId", "188")
        .param("schemeId", "4")
        .non_null(&["PatientId"])
        .echoes("PatientId", "patientId"),
        endpoint(
            "getInvoicesByDateRange",
            "/Billing/Invoices",
            columns("Results", &["InvoiceNumber", "InvoiceCode"]),
        )
        .describe("Invoices in a date range")
        .date_range(INVOICE_TO_DATE)
        .all_non_null(),
        endpoint(
            "getProviderList",
            "/Billing/GetProviderList",
            columns("Results", &["EmployeeId", "EmployeeName"]),
        )
        .describe("Billing providers")
        .all_non_null()
        .unique(&["EmployeeId", "EmployeeName"]),
        endpoint(
            "getUsersList",
            "/Billing/ListUsers",
            columns("Results", &["UserId", "ShortName", "DepartmentName"]),
        )
        .describe("Billing users")
        .all_non_null()
        .unique(&["UserId", "ShortName"]),
        endpoint(
            "getCurrentFiscalYearDetails",
            "/Billing/CurrentFiscalYear",
            pair("Results", ["FiscalYearId", "FiscalYearName"]),
        )
        .describe("Current fiscal year")
        .all_non_null(),
    ]
}
