//! Operation execution.
//!
//! Every response position is completed into a [`Completion`]: its value
//! plus the errors raised while producing it. Sibling completions are merged
//! in selection order once all of them are done, so the order in which
//! concurrent branches finish never shows in the result.

use crate::collect::{Collector, GroupedFields};
use crate::result::ExecutionResult;
use crate::scheduling::Scheduling;
use crate::variables::coerce_variable_values;
use futures::future::{join_all, BoxFuture, FutureExt};
use graphweave_core::{Diagnostic, Diagnostics, Interrupt, Map, PathSegment, RequestContext, Value};
use graphweave_language::{Document, Field, OperationDefinition, OperationType, ValueNode};
use graphweave_schema::{
    coerce_input_value, default_resolve, serialize_leaf, value_from_ast, FieldDefinition, FieldError,
    NamedType, ObjectType, ResolveInfo, Resolver, Schema, TypeRef,
};
use std::sync::Arc;
use tracing::{debug, trace};

/// Meta-field answered by every object type with its own name
const TYPENAME_FIELD: &str = "__typename";

/// Everything needed to execute one document
#[derive(Debug, Clone)]
pub struct ExecuteParams {
    /// Schema the document was validated against
    pub schema: Arc<Schema>,
    /// Parsed, validated document
    pub document: Arc<Document>,
    /// Parent value of the root fields
    pub root: Value,
    /// Operation to run; may be omitted when the document has one operation
    pub operation_name: Option<String>,
    /// Raw variable values
    pub args: Map,
    /// Cancellation, deadline and request data
    pub context: RequestContext,
}

impl ExecuteParams {
    /// Parameters with a null root, no variables and a fresh context
    #[must_use]
    pub fn new(schema: Arc<Schema>, document: Arc<Document>) -> Self {
        Self {
            schema,
            document,
            root: Value::Null,
            operation_name: None,
            args: Map::new(),
            context: RequestContext::new(),
        }
    }

    /// Set the root value
    #[must_use]
    pub fn with_root(mut self, root: impl Into<Value>) -> Self {
        self.root = root.into();
        self
    }

    /// Select an operation by name
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Set the variable values
    #[must_use]
    pub fn with_args(mut self, args: Map) -> Self {
        self.args = args;
        self
    }

    /// Set the request context
    #[must_use]
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }
}

/// Why a response position holds no value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Halt {
    /// A non-null position ended up null; the nearest nullable ancestor becomes null
    Null,
    /// The request was interrupted; nothing more is produced
    Interrupted(Interrupt),
}

/// Value of one response position and the errors raised producing it
#[derive(Debug)]
struct Completion {
    value: Result<Value, Halt>,
    errors: Diagnostics,
}

impl Completion {
    fn ok(value: Value) -> Self {
        Self {
            value: Ok(value),
            errors: Diagnostics::new(),
        }
    }

    fn interrupted(interrupt: Interrupt) -> Self {
        Self {
            value: Err(Halt::Interrupted(interrupt)),
            errors: Diagnostics::new(),
        }
    }

    fn field_error(message: impl Into<String>, field: &Field, path: &[PathSegment]) -> Self {
        Self {
            value: Err(Halt::Null),
            errors: Diagnostics::from(field_diagnostic(message, field, path)),
        }
    }

    /// Settle a propagated null here if the position is nullable
    fn at_position(mut self, ty: &TypeRef) -> Self {
        if self.value == Err(Halt::Null) && !ty.is_non_null() {
            self.value = Ok(Value::Null);
        }
        self
    }
}

fn field_diagnostic(message: impl Into<String>, field: &Field, path: &[PathSegment]) -> Diagnostic {
    Diagnostic::with_locations(message, [field.location]).at_path(path.to_vec())
}

/// Merge sibling completions in order
///
/// Errors are kept in sibling order. Any sibling that halted with a null
/// makes the whole group null; an interruption ends the merge.
fn merge<T>(
    completions: impl IntoIterator<Item = (T, Completion)>,
    mut accept: impl FnMut(T, Value),
) -> (Result<(), Halt>, Diagnostics) {
    let mut errors = Diagnostics::new();
    let mut outcome = Ok(());
    for (key, completion) in completions {
        errors.append(completion.errors);
        match completion.value {
            Ok(value) => accept(key, value),
            Err(Halt::Null) => outcome = Err(Halt::Null),
            Err(halt @ Halt::Interrupted(_)) => return (Err(halt), errors),
        }
    }
    (outcome, errors)
}

/// State shared by every field of one operation
struct Execution<'a> {
    schema: &'a Schema,
    collector: Collector<'a>,
    variables: &'a Map,
    context: &'a RequestContext,
    scheduling: Scheduling,
}

impl<'a> Execution<'a> {
    /// Await branches one by one, or all at once when the scheduling allows it
    async fn run<'f>(&self, branches: Vec<BoxFuture<'f, Completion>>, serial: bool) -> Vec<Completion> {
        if serial || !self.scheduling.is_concurrent() {
            let mut completions = Vec::with_capacity(branches.len());
            for branch in branches {
                let completion = branch.await;
                let interrupted = matches!(completion.value, Err(Halt::Interrupted(_)));
                completions.push(completion);
                if interrupted {
                    break;
                }
            }
            completions
        } else {
            join_all(branches).await
        }
    }

    fn execute_fields(
        &'a self,
        object_type: &'a ObjectType,
        parent: Arc<Value>,
        path: Vec<PathSegment>,
        grouped: GroupedFields<'a>,
        serial: bool,
    ) -> BoxFuture<'a, Completion> {
        async move {
            let mut keys = Vec::with_capacity(grouped.len());
            let mut branches = Vec::with_capacity(grouped.len());
            for (key, fields) in grouped {
                let mut field_path = path.clone();
                field_path.push(PathSegment::from(key));
                if let Some(branch) = self.execute_field(object_type, Arc::clone(&parent), fields, field_path) {
                    keys.push(key);
                    branches.push(branch);
                }
            }

            let completions = self.run(branches, serial).await;
            let mut data = Map::with_capacity(keys.len());
            let (outcome, errors) = merge(keys.into_iter().zip(completions), |key, value| {
                data.insert(key.to_string(), value);
            });
            Completion {
                value: outcome.map(|()| Value::Object(data)),
                errors,
            }
        }
        .boxed()
    }

    /// Resolve and complete one response key; `None` for fields the type does not define
    fn execute_field(
        &'a self,
        object_type: &'a ObjectType,
        parent: Arc<Value>,
        fields: Vec<&'a Field>,
        path: Vec<PathSegment>,
    ) -> Option<BoxFuture<'a, Completion>> {
        let field = *fields.first()?;
        if field.name == TYPENAME_FIELD {
            let name = Value::from(object_type.name.as_str());
            return Some(futures::future::ready(Completion::ok(name)).boxed());
        }
        let definition = object_type.get_field(&field.name)?;
        let return_type = &definition.field_type;

        Some(
            async move {
                let arguments = match self.coerce_arguments(definition, field) {
                    Ok(arguments) => arguments,
                    Err(message) => return Completion::field_error(message, field, &path).at_position(return_type),
                };
                let info = ResolveInfo {
                    field_name: field.name.clone(),
                    parent_type: object_type.name.clone(),
                    return_type: return_type.clone(),
                    path: path.clone(),
                    parent,
                    arguments,
                    context: self.context.clone(),
                };
                let resolved = match self.resolve(definition.resolver.clone(), info).await {
                    Ok(value) => value,
                    Err(FieldError::Interrupted(interrupt)) => return Completion::interrupted(interrupt),
                    Err(FieldError::Message(message)) => {
                        return Completion::field_error(message, field, &path).at_position(return_type);
                    }
                };
                self.complete_value(return_type, object_type, &fields, resolved, path)
                    .await
                    .at_position(return_type)
            }
            .boxed(),
        )
    }

    /// Call the field's resolver, observing cancellation and the deadline
    async fn resolve(&self, resolver: Option<Arc<dyn Resolver>>, info: ResolveInfo) -> Result<Value, FieldError> {
        self.context.check()?;
        trace!(field = %info.field_name, parent = %info.parent_type, "Resolving field");
        let Some(resolver) = resolver else {
            return default_resolve(&info);
        };
        if !self.scheduling.is_concurrent() {
            return resolver.resolve(&info);
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return resolver.resolve(&info);
        };

        let task = handle.spawn_blocking(move || resolver.resolve(&info));
        tokio::select! {
            biased;
            interrupt = self.context.interrupted() => Err(FieldError::Interrupted(interrupt)),
            joined = task => joined.unwrap_or_else(|err| {
                if err.is_panic() {
                    Err(FieldError::new("resolver panicked"))
                } else {
                    Err(FieldError::new("resolver task was cancelled"))
                }
            }),
        }
    }

    fn complete_value<'f>(
        &'a self,
        return_type: &'a TypeRef,
        parent_type: &'a ObjectType,
        fields: &'f [&'a Field],
        result: Value,
        path: Vec<PathSegment>,
    ) -> BoxFuture<'f, Completion>
    where
        'a: 'f,
    {
        async move {
            let field = fields[0];
            match return_type {
                TypeRef::NonNull(inner) => {
                    let mut completion = self
                        .complete_value(inner, parent_type, fields, result, path.clone())
                        .await;
                    if completion.value == Ok(Value::Null) {
                        completion.errors.push(field_diagnostic(
                            format!(
                                "Cannot return null for non-nullable field {}.{}.",
                                parent_type.name, field.name
                            ),
                            field,
                            &path,
                        ));
                        completion.value = Err(Halt::Null);
                    }
                    completion
                }
                _ if result.is_null() => Completion::ok(Value::Null),
                TypeRef::List(item_type) => {
                    let Value::List(items) = result else {
                        let message = format!(
                            "Expected Iterable, but did not find one for field \"{}.{}\".",
                            parent_type.name, field.name
                        );
                        return Completion::field_error(message, field, &path);
                    };
                    let branches: Vec<_> = items
                        .into_iter()
                        .enumerate()
                        .map(|(index, item)| {
                            let mut item_path = path.clone();
                            item_path.push(PathSegment::Index(index));
                            async move {
                                self.complete_value(item_type, parent_type, fields, item, item_path)
                                    .await
                                    .at_position(item_type)
                            }
                            .boxed()
                        })
                        .collect();
                    let completions = self.run(branches, false).await;
                    let mut list = Vec::with_capacity(completions.len());
                    let (outcome, errors) = merge(completions.into_iter().map(|c| ((), c)), |(), value| {
                        list.push(value);
                    });
                    Completion {
                        value: outcome.map(|()| Value::List(list)),
                        errors,
                    }
                }
                TypeRef::Named(name) => match self.schema.get_type(name) {
                    Some(NamedType::Object(object_type)) => {
                        let grouped = self.collector.collect_subfields(object_type, fields);
                        self.execute_fields(object_type, Arc::new(result), path, grouped, false)
                            .await
                    }
                    Some(named) => match serialize_leaf(named, &result) {
                        Ok(value) => Completion::ok(value),
                        Err(err) => Completion::field_error(err.message, field, &path),
                    },
                    None => Completion::field_error(format!("Unknown type \"{}\".", name), field, &path),
                },
            }
        }
        .boxed()
    }

    /// Coerce the arguments of a field from literals, variables and defaults
    fn coerce_arguments(&self, definition: &FieldDefinition, field: &Field) -> Result<Map, String> {
        let mut coerced = Map::new();
        for (name, argument) in &definition.arguments {
            let ty = &argument.value_type;
            let value = match field.argument(name).map(|arg| &arg.value) {
                Some(ValueNode::Variable(variable)) => match self.variables.get(variable) {
                    Some(value) => Some(coerce_input_value(self.schema, ty, value).map_err(|err| {
                        format!("Argument \"{}\" has invalid value ${}: {}", name, variable, err)
                    })?),
                    None if argument.default_value.is_some() => argument.default_value.clone(),
                    None if ty.is_non_null() => {
                        return Err(format!(
                            "Argument \"{}\" of required type \"{}\" was provided the variable \"${}\" which was not provided a runtime value.",
                            name, ty, variable
                        ));
                    }
                    None => None,
                },
                Some(node) => Some(
                    value_from_ast(self.schema, node, ty, Some(self.variables))
                        .map_err(|err| format!("Argument \"{}\" has invalid value {}: {}", name, node, err))?,
                ),
                None => match &argument.default_value {
                    Some(default) => Some(default.clone()),
                    None if ty.is_non_null() => {
                        return Err(format!(
                            "Argument \"{}\" of required type \"{}\" was not provided.",
                            name, ty
                        ));
                    }
                    None => None,
                },
            };
            if let Some(value) = value {
                coerced.insert(name.clone(), value);
            }
        }
        Ok(coerced)
    }
}

fn select_operation<'d>(document: &'d Document, name: Option<&str>) -> Result<&'d OperationDefinition, Diagnostic> {
    match name {
        Some(name) => document
            .operations()
            .find(|operation| operation.name.as_deref() == Some(name))
            .ok_or_else(|| Diagnostic::new(format!("Unknown operation named \"{}\".", name))),
        None => {
            let mut operations = document.operations();
            match (operations.next(), operations.next()) {
                (Some(operation), None) => Ok(operation),
                (None, _) => Err(Diagnostic::new("Must provide an operation.")),
                (Some(_), Some(_)) => Err(Diagnostic::new(
                    "Must provide operation name if query contains multiple operations.",
                )),
            }
        }
    }
}

fn root_type<'s>(schema: &'s Schema, operation: &OperationDefinition) -> Result<&'s ObjectType, Diagnostic> {
    match operation.operation {
        OperationType::Subscription => Err(Diagnostic::with_locations(
            "Subscription operations are not supported.",
            [operation.location],
        )),
        kind => schema.root_type(kind).ok_or_else(|| {
            Diagnostic::with_locations(format!("Schema is not configured for {}s.", kind), [operation.location])
        }),
    }
}

/// Execute one operation of a validated document
///
/// Request-level problems (operation selection, variable coercion, a
/// missing root type) produce a result without data. Field errors are
/// collected next to partial data. An interruption produces a result
/// without data whose single diagnostic names the cause.
///
/// With [`Scheduling::WorkerPool`] the returned future should be polled
/// inside a Tokio runtime with time enabled; outside one, resolvers run on
/// the polling thread.
///
/// # Panics
///
/// Panics if polled with [`Scheduling::WorkerPool`] on a Tokio runtime
/// built without the time driver while the request context carries a
/// deadline. `Pipeline::execute` avoids this by running on its own runtime.
pub async fn execute(params: ExecuteParams, scheduling: Scheduling) -> ExecutionResult {
    let ExecuteParams {
        schema,
        document,
        root,
        operation_name,
        args,
        context,
    } = params;

    let name = operation_name.as_deref().filter(|name| !name.is_empty());
    let operation = match select_operation(&document, name) {
        Ok(operation) => operation,
        Err(diagnostic) => return ExecutionResult::from_errors(diagnostic),
    };
    let root_type = match root_type(&schema, operation) {
        Ok(root_type) => root_type,
        Err(diagnostic) => return ExecutionResult::from_errors(diagnostic),
    };
    let variables = match coerce_variable_values(&schema, operation, &args) {
        Ok(variables) => variables,
        Err(errors) => {
            debug!(errors = errors.len(), "Variable coercion failed");
            return ExecutionResult::from_errors(errors);
        }
    };

    debug!(
        operation = operation.name.as_deref().unwrap_or("<anonymous>"),
        kind = %operation.operation,
        %scheduling,
        "Executing operation"
    );
    let execution = Execution {
        schema: &schema,
        collector: Collector::new(&schema, &document, &variables),
        variables: &variables,
        context: &context,
        scheduling,
    };
    let grouped = execution.collector.collect(root_type, &operation.selection_set);
    let serial = operation.operation == OperationType::Mutation;
    let completion = execution
        .execute_fields(root_type, Arc::new(root), Vec::new(), grouped, serial)
        .await;

    match completion.value {
        Ok(data) => {
            debug!(errors = completion.errors.len(), "Execution finished");
            ExecutionResult::new(data, completion.errors)
        }
        Err(Halt::Null) => {
            debug!(errors = completion.errors.len(), "Execution finished with null data");
            ExecutionResult::new(Value::Null, completion.errors)
        }
        Err(Halt::Interrupted(interrupt)) => {
            debug!(%interrupt, "Execution interrupted");
            ExecutionResult::from_errors(Diagnostic::new(interrupt.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphweave_core::Location;
    use graphweave_language::{parse, Source};
    use graphweave_schema::{EnumType, FieldDefinition, InputValueDefinition};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    fn user(id: i64, name: Option<&str>) -> Value {
        [("id", Value::Int(id)), ("name", Value::from(name))].into_iter().collect()
    }

    fn schema(log: Arc<Mutex<Vec<String>>>) -> Arc<Schema> {
        let user_type = ObjectType::new("User")
            .field(FieldDefinition::new("id", TypeRef::non_null(TypeRef::named("ID"))))
            .field(FieldDefinition::new("name", TypeRef::named("String")))
            .field(
                FieldDefinition::new("strictName", TypeRef::non_null(TypeRef::named("String")))
                    .resolve(|info| Ok(info.parent().get("name").cloned().unwrap_or_default())),
            );
        let query = ObjectType::new("Query")
            .field(FieldDefinition::new("hello", TypeRef::named("String")).resolve(|_| Ok(Value::from("world"))))
            .field(FieldDefinition::new("broken", TypeRef::named("String")).resolve(|_| Err(FieldError::new("boom"))))
            .field(
                FieldDefinition::new("echo", TypeRef::named("Int"))
                    .argument(InputValueDefinition::new("n", TypeRef::named("Int")).default_value(7))
                    .resolve(|info| Ok(info.argument("n").cloned().unwrap_or_default())),
            )
            .field(
                FieldDefinition::new("user", TypeRef::named("User"))
                    .argument(InputValueDefinition::new("id", TypeRef::non_null(TypeRef::named("ID"))))
                    .resolve(|info| {
                        let id = info.argument("id").and_then(Value::as_str).unwrap_or("0");
                        let id: i64 = id.parse().map_err(|_| FieldError::new("bad id"))?;
                        Ok(if id == 2 { user(2, None) } else { user(id, Some("Ada")) })
                    }),
            )
            .field(
                FieldDefinition::new("users", TypeRef::list(TypeRef::non_null(TypeRef::named("User"))))
                    .resolve(|_| Ok(Value::from(vec![user(1, Some("Ada")), user(2, None)]))),
            )
            .field(
                FieldDefinition::new("numbers", TypeRef::list(TypeRef::named("Int")))
                    .resolve(|_| Ok(Value::from(vec![Value::Int(1), Value::Float(2.5), Value::Int(3)]))),
            )
            .field(
                FieldDefinition::new("color", TypeRef::named("Color")).resolve(|_| Ok(Value::from("PURPLE"))),
            )
            .field(
                FieldDefinition::new("required", TypeRef::non_null(TypeRef::named("String")))
                    .resolve(|_| Ok(Value::Null)),
            )
            .field(FieldDefinition::new("fromRoot", TypeRef::named("String")))
            .field(
                FieldDefinition::new("panics", TypeRef::named("String"))
                    .resolve(|_| -> Result<Value, FieldError> { panic!("resolver bug") }),
            )
            .field(
                FieldDefinition::new("waits", TypeRef::named("String")).resolve(|info| {
                    while info.context().check().is_ok() {
                        std::thread::sleep(Duration::from_millis(5));
                    }
                    Ok(Value::from("late"))
                }),
            );
        let record = |log: &Arc<Mutex<Vec<String>>>, entry: &'static str| {
            let log = Arc::clone(log);
            move |_: &ResolveInfo| -> Result<Value, FieldError> {
                log.lock().unwrap().push(entry.to_string());
                Ok(Value::from(entry))
            }
        };
        let mutation = ObjectType::new("Mutation")
            .field(FieldDefinition::new("first", TypeRef::named("String")).resolve(record(&log, "first")))
            .field(FieldDefinition::new("second", TypeRef::named("String")).resolve(record(&log, "second")));

        Arc::new(
            Schema::builder()
                .query(query)
                .mutation(mutation)
                .register(user_type)
                .register(EnumType::new("Color").value("RED"))
                .build()
                .unwrap(),
        )
    }

    fn params(text: &str) -> ExecuteParams {
        let document = parse(&Source::anonymous(text)).unwrap();
        ExecuteParams::new(schema(Arc::default()), Arc::new(document))
    }

    fn run_single(params: ExecuteParams) -> ExecutionResult {
        futures::executor::block_on(execute(params, Scheduling::SingleThread))
    }

    fn data(result: &ExecutionResult) -> serde_json::Value {
        serde_json::Value::from(result.data.clone().unwrap())
    }

    fn messages(result: &ExecutionResult) -> Vec<&str> {
        result.errors.iter().map(|error| error.message.as_str()).collect()
    }

    #[test]
    fn test_selection_order_and_aliases() {
        let result = run_single(params("{ b: hello echo a: hello __typename }"));
        assert!(result.is_ok());
        assert_eq!(result.to_json().unwrap(), r#"{"data":{"b":"world","echo":7,"a":"world","__typename":"Query"}}"#);
    }

    #[test]
    fn test_partial_failure() {
        let result = run_single(params("{ hello\n  broken }"));
        assert_eq!(data(&result), serde_json::json!({"hello": "world", "broken": null}));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, "boom");
        assert_eq!(result.errors[0].locations, vec![Location::new(2, 3)]);
        assert_eq!(result.errors[0].path, Some(vec![PathSegment::from("broken")]));
    }

    #[test]
    fn test_non_null_propagates_to_nullable_parent() {
        let result = run_single(params("{ user(id: \"2\") { id strictName } hello }"));
        assert_eq!(data(&result), serde_json::json!({"user": null, "hello": "world"}));
        assert_eq!(messages(&result), vec!["Cannot return null for non-nullable field User.strictName."]);
        assert_eq!(
            result.errors[0].path,
            Some(vec![PathSegment::from("user"), PathSegment::from("strictName")])
        );
    }

    #[test]
    fn test_non_null_list_item_nulls_list() {
        let result = run_single(params("{ users { id strictName } }"));
        assert_eq!(data(&result), serde_json::json!({"users": null}));
        assert_eq!(
            result.errors[0].path,
            Some(vec![PathSegment::from("users"), PathSegment::from(1), PathSegment::from("strictName")])
        );
    }

    #[test]
    fn test_non_null_root_field_nulls_data() {
        let result = run_single(params("{ hello required }"));
        assert_eq!(result.data, Some(Value::Null));
        assert_eq!(messages(&result), vec!["Cannot return null for non-nullable field Query.required."]);
    }

    #[test]
    fn test_leaf_serialization_errors() {
        let result = run_single(params("{ numbers color }"));
        assert_eq!(data(&result), serde_json::json!({"numbers": [1, null, 3], "color": null}));
        assert_eq!(
            messages(&result),
            vec![
                "Int cannot represent non-integer value: 2.5",
                "Enum \"Color\" cannot represent value: \"PURPLE\"",
            ]
        );
        assert_eq!(
            result.errors[0].path,
            Some(vec![PathSegment::from("numbers"), PathSegment::from(1)])
        );
    }

    #[test]
    fn test_arguments_and_variables() {
        let mut args = Map::new();
        args.insert("n".to_string(), Value::Int(3));
        let result = run_single(
            params("query Q($n: Int, $m: Int) { a: echo(n: $n) b: echo(n: $m) c: echo(n: 1) d: echo }").with_args(args),
        );
        assert_eq!(data(&result), serde_json::json!({"a": 3, "b": 7, "c": 1, "d": 7}));
    }

    #[test]
    fn test_root_value_and_default_resolver() {
        let root: Value = [("fromRoot", "root says hi")].into_iter().collect();
        let result = run_single(params("{ fromRoot }").with_root(root));
        assert_eq!(data(&result), serde_json::json!({"fromRoot": "root says hi"}));
    }

    #[test]
    fn test_operation_selection() {
        let text = "query A { hello } query B { echo }";
        let result = run_single(params(text));
        assert_eq!(result.data, None);
        assert_eq!(messages(&result), vec!["Must provide operation name if query contains multiple operations."]);

        let result = run_single(params(text).with_operation_name("C"));
        assert_eq!(messages(&result), vec!["Unknown operation named \"C\"."]);

        let result = run_single(params(text).with_operation_name("B"));
        assert_eq!(data(&result), serde_json::json!({"echo": 7}));
    }

    #[test]
    fn test_request_level_errors() {
        let result = run_single(params("subscription { hello }"));
        assert_eq!(result.data, None);
        assert_eq!(messages(&result), vec!["Subscription operations are not supported."]);

        let result = run_single(params("query Q($n: Int!) { echo(n: $n) }"));
        assert_eq!(result.data, None);
        assert_eq!(messages(&result), vec!["Variable \"$n\" of required type \"Int!\" was not provided."]);
    }

    #[test]
    fn test_mutations_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let document = parse(&Source::anonymous("mutation { second first second }")).unwrap();
        let params = ExecuteParams::new(schema(Arc::clone(&log)), Arc::new(document));
        let result = run_single(params);
        assert_eq!(data(&result), serde_json::json!({"second": "second", "first": "first"}));
        assert_eq!(*log.lock().unwrap(), vec!["second", "first"]);
    }

    #[test]
    fn test_cancelled_before_start() {
        let context = RequestContext::new();
        context.cancel();
        let result = run_single(params("{ hello broken }").with_context(context));
        assert_eq!(result.data, None);
        assert_eq!(messages(&result), vec!["request cancelled"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_worker_pool_matches_single_thread() {
        let text = "{ users { id name } broken hello numbers u: user(id: 1) { strictName } color }";
        let concurrent = execute(params(text), Scheduling::WorkerPool).await;
        let sequential = tokio::task::spawn_blocking(move || run_single(params(text))).await.unwrap();
        assert_eq!(concurrent, sequential);
        assert_eq!(concurrent.errors.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_worker_pool_mutations_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let document = parse(&Source::anonymous("mutation { first second }")).unwrap();
        let params = ExecuteParams::new(schema(Arc::clone(&log)), Arc::new(document));
        let result = execute(params, Scheduling::WorkerPool).await;
        assert!(result.is_ok());
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_worker_pool_panic_becomes_field_error() {
        let result = execute(params("{ hello panics }"), Scheduling::WorkerPool).await;
        assert_eq!(data(&result), serde_json::json!({"hello": "world", "panics": null}));
        assert_eq!(messages(&result), vec!["resolver panicked"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_worker_pool_cancellation_in_flight() {
        let context = RequestContext::new();
        let canceller = context.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            canceller.cancel();
        });
        let started = Instant::now();
        let result = execute(params("{ hello waits }").with_context(context), Scheduling::WorkerPool).await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(result.data, None);
        assert_eq!(messages(&result), vec!["request cancelled"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_worker_pool_deadline() {
        let context = RequestContext::new().with_timeout(Duration::from_millis(30));
        let result = execute(params("{ waits }").with_context(context), Scheduling::WorkerPool).await;
        assert_eq!(result.data, None);
        assert_eq!(messages(&result), vec!["request deadline exceeded"]);
    }
}
