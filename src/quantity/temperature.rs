quantity!(Celsius, "°C");
