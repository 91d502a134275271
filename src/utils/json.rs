use serde_json::Map;
use serde_json::Value;

/// Typed field lookup on JSON objects.
///
/// Every lookup reports absence (or a type mismatch) as `None` and never
/// panics, which is all the response decoders need.
pub(crate) trait JsonFields {
    fn field_object(
        &self,
        name: &str,
    ) -> Option<&Map<String, Value>>;

    fn field_i64(
        &self,
        name: &str,
    ) -> Option<i64>;

    fn field_str(
        &self,
        name: &str,
    ) -> Option<&str>;

    fn field_bool(
        &self,
        name: &str,
    ) -> Option<bool>;

    fn field_array(
        &self,
        name: &str,
    ) -> Option<&Vec<Value>>;
}

impl JsonFields for Map<String, Value> {
    fn field_object(
        &self,
        name: &str,
    ) -> Option<&Map<String, Value>> {
        self.get(name).and_then(Value::as_object)
    }

    fn field_i64(
        &self,
        name: &str,
    ) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    fn field_str(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    fn field_bool(
        &self,
        name: &str,
    ) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    fn field_array(
        &self,
        name: &str,
    ) -> Option<&Vec<Value>> {
        self.get(name).and_then(Value::as_array)
    }
}

impl JsonFields for Value {
    fn field_object(
        &self,
        name: &str,
    ) -> Option<&Map<String, Value>> {
        self.as_object().and_then(|o| o.field_object(name))
    }

    fn field_i64(
        &self,
        name: &str,
    ) -> Option<i64> {
        self.as_object().and_then(|o| o.field_i64(name))
    }

    fn field_str(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.as_object().and_then(|o| o.field_str(name))
    }

    fn field_bool(
        &self,
        name: &str,
    ) -> Option<bool> {
        self.as_object().and_then(|o| o.field_bool(name))
    }

    fn field_array(
        &self,
        name: &str,
    ) -> Option<&Vec<Value>> {
        self.as_object().and_then(|o| o.field_array(name))
    }
}
