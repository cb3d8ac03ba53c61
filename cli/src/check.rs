use k8s_openapi::{
    api::core::v1::{Node, Service},
    apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition,
};
use kube::{api::ListParams, Api, Client};
use serde::Serialize;

const CHECK: &str = "√";
const WARN: &str = "‼";
const EX: &str = "×";

const CATEGORY: &str = "kube-service-viewer";
const VIRTUAL_SERVICE_CRD: &str = "virtualservices.gateway.solo.io";

#[derive(Serialize)]
struct CheckOutput {
    success: bool,
    categories: Vec<Category>,
}

#[derive(Serialize)]
struct Category {
    category_name: &'static str,
    checks: Vec<CheckResult>,
}

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    #[default]
    Success,
    Warning,
    Error,
}

#[derive(Debug, Serialize, Default)]
pub struct CheckResult {
    description: &'static str,
    result: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CheckResult {
    /// Warnings don't fail a check run.
    pub fn success(&self) -> bool {
        !matches!(self.result, CheckStatus::Error)
    }

    fn list<T>(description: &'static str, hint: &'static str, res: kube::Result<T>) -> Self {
        match res {
            Ok(_) => Self {
                description,
                ..Default::default()
            },
            Err(err) => Self {
                description,
                result: CheckStatus::Error,
                error: Some(err.to_string()),
                hint: Some(hint),
            },
        }
    }
}

pub async fn services_check(client: Client) -> CheckResult {
    let api = Api::<Service>::all(client);
    CheckResult::list(
        "can list services in all namespaces",
        "grant `list` on `services` cluster-wide",
        api.list(&ListParams::default().limit(1)).await,
    )
}

pub async fn nodes_check(client: Client) -> CheckResult {
    let api = Api::<Node>::all(client);
    CheckResult::list(
        "can list nodes",
        "grant `list` on `nodes`; node port URLs have no address without it",
        api.list(&ListParams::default().limit(1)).await,
    )
}

pub async fn virtual_service_crd_check(client: Client) -> CheckResult {
    let api = Api::<CustomResourceDefinition>::all(client);
    let description = "VirtualService CRD exists";
    match api.get_opt(VIRTUAL_SERVICE_CRD).await {
        Ok(Some(_)) => CheckResult {
            description,
            ..Default::default()
        },
        Ok(None) => CheckResult {
            description,
            result: CheckStatus::Warning,
            error: Some("VirtualService CRD is not installed".into()),
            hint: Some("gateway routes are only listed when Gloo Edge is installed"),
        },
        Err(err) => CheckResult {
            description,
            result: CheckStatus::Warning,
            error: Some(err.to_string()),
            hint: Some("grant `get` on `customresourcedefinitions` to verify the CRD"),
        },
    }
}

pub async fn run_checks(client: Client) -> Vec<CheckResult> {
    vec![
        services_check(client.clone()).await,
        nodes_check(client.clone()).await,
        virtual_service_crd_check(client).await,
    ]
}

pub fn print_checks(results: Vec<CheckResult>) -> bool {
    let mut success = true;
    println!("{}", CATEGORY);
    println!("{}", CATEGORY.chars().map(|_| '-').collect::<String>());
    for result in results {
        let symbol = match result.result {
            CheckStatus::Success => CHECK,
            CheckStatus::Warning => WARN,
            CheckStatus::Error => {
                success = false;
                EX
            }
        };
        println!("{} {}", symbol, result.description);
        if let Some(error) = result.error {
            println!("    {}", error);
        }
        if let Some(hint) = result.hint {
            println!("    hint: {}", hint);
        }
    }

    println!();
    let success_symbol = if success { CHECK } else { EX };
    println!("Status check results are {}", success_symbol);
    success
}

pub fn json_print_checks(results: Vec<CheckResult>) -> bool {
    let success = results.iter().all(CheckResult::success);
    let output = CheckOutput {
        success,
        categories: vec![Category {
            category_name: CATEGORY,
            checks: results,
        }],
    };
    serde_json::to_writer_pretty(std::io::stdout(), &output).expect("serialization failed");
    println!();
    success
}
